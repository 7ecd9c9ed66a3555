//! Feedback sentiment: polarity scoring of free text and per-product aggregation.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::SentimentConfig;
use crate::types::{FeedbackEntry, Sentiment};

// =============================================================================
// Aggregation
// =============================================================================

/// Feedback counts for one product, grouped by sentiment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
}

impl SentimentCounts {
    pub fn new(positive: u64, negative: u64, neutral: u64) -> Self {
        Self {
            positive,
            negative,
            neutral,
        }
    }

    pub fn total(&self) -> u64 {
        self.positive + self.negative + self.neutral
    }

    pub fn add(&mut self, sentiment: Sentiment, count: u64) {
        match sentiment {
            Sentiment::Positive => self.positive += count,
            Sentiment::Negative => self.negative += count,
            Sentiment::Neutral => self.neutral += count,
        }
    }

    /// Majority label for these counts.
    ///
    /// Positive or negative must strictly beat both other counts. Neutral wins
    /// when it is at least as large as both. Anything left over is mixed.
    pub fn label(&self) -> SummaryLabel {
        let (pos, neg, neu) = (self.positive, self.negative, self.neutral);
        if self.total() == 0 {
            SummaryLabel::NoData
        } else if pos > neg && pos > neu {
            SummaryLabel::Positive
        } else if neg > pos && neg > neu {
            SummaryLabel::Negative
        } else if neu >= pos && neu >= neg {
            SummaryLabel::Neutral
        } else {
            SummaryLabel::Mixed
        }
    }
}

impl FromIterator<Sentiment> for SentimentCounts {
    fn from_iter<I: IntoIterator<Item = Sentiment>>(iter: I) -> Self {
        let mut counts = SentimentCounts::default();
        for sentiment in iter {
            counts.add(sentiment, 1);
        }
        counts
    }
}

/// Categorical outcome of a feedback aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLabel {
    Positive,
    Negative,
    Neutral,
    Mixed,
    /// No feedback rows at all; distinct from `Mixed`.
    NoData,
}

impl fmt::Display for SummaryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryLabel::Positive => write!(f, "positive"),
            SummaryLabel::Negative => write!(f, "negative"),
            SummaryLabel::Neutral => write!(f, "neutral"),
            SummaryLabel::Mixed => write!(f, "mixed"),
            SummaryLabel::NoData => write!(f, "no data"),
        }
    }
}

/// Label plus the counts it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub label: SummaryLabel,
    pub counts: SentimentCounts,
}

impl FeedbackSummary {
    pub fn from_counts(counts: SentimentCounts) -> Self {
        Self {
            label: counts.label(),
            counts,
        }
    }

    /// Customer-facing sentence for this summary.
    pub fn describe(&self, product_name: &str) -> String {
        match self.label {
            SummaryLabel::Positive => {
                format!("Most customers are satisfied with '{}'.", product_name)
            }
            SummaryLabel::Negative => {
                format!("Many customers had concerns about '{}'.", product_name)
            }
            SummaryLabel::Neutral => format!("Feedback for '{}' is mostly neutral.", product_name),
            SummaryLabel::Mixed => format!("Feedback for '{}' is mixed.", product_name),
            SummaryLabel::NoData => {
                format!("No feedback data available for '{}'.", product_name)
            }
        }
    }
}

/// Group feedback rows by sentiment and pick the majority label.
pub fn aggregate(rows: &[FeedbackEntry]) -> FeedbackSummary {
    let counts: SentimentCounts = rows.iter().map(|r| r.sentiment).collect();
    FeedbackSummary::from_counts(counts)
}

// =============================================================================
// Polarity scoring
// =============================================================================

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]+(?:'[a-z]+)?").expect("static regex"));

/// Opinion words and their polarity in `-1.0..=1.0`.
const LEXICON: &[(&str, f64)] = &[
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("brilliant", 0.9),
    ("cheap", 0.4),
    ("comfortable", 0.4),
    ("cool", 0.35),
    ("delighted", 0.7),
    ("excellent", 1.0),
    ("fantastic", 0.4),
    ("fast", 0.2),
    ("fine", 0.4),
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("helpful", 0.5),
    ("impressive", 1.0),
    ("like", 0.3),
    ("love", 0.5),
    ("lovely", 0.5),
    ("nice", 0.6),
    ("perfect", 1.0),
    ("pleased", 0.5),
    ("recommend", 0.4),
    ("reliable", 0.5),
    ("satisfied", 0.5),
    ("superb", 1.0),
    ("wonderful", 1.0),
    ("worth", 0.3),
    ("angry", -0.5),
    ("annoying", -0.8),
    ("awful", -1.0),
    ("bad", -0.7),
    ("broke", -0.4),
    ("broken", -0.4),
    ("cheaply", -0.3),
    ("damaged", -0.6),
    ("defective", -0.7),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("expensive", -0.5),
    ("faulty", -0.6),
    ("hate", -0.8),
    ("horrible", -1.0),
    ("late", -0.3),
    ("poor", -0.4),
    ("problem", -0.3),
    ("rude", -0.6),
    ("slow", -0.3),
    ("terrible", -1.0),
    ("unhappy", -0.6),
    ("useless", -0.5),
    ("waste", -0.6),
    ("worse", -0.4),
    ("worst", -1.0),
    ("wrong", -0.5),
];

/// Words that scale the next opinion word.
const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.3),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("really", 1.3),
    ("so", 1.3),
    ("super", 1.3),
    ("too", 1.3),
    ("totally", 1.3),
    ("very", 1.3),
    ("slightly", 0.5),
    ("somewhat", 0.7),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "nothing", "hardly", "without"];

/// Negated opinion words flip sign and lose half their weight.
const NEGATION_FACTOR: f64 = -0.5;

static LEXICON_MAP: LazyLock<HashMap<&'static str, f64>> =
    LazyLock::new(|| LEXICON.iter().copied().collect());

static INTENSIFIER_MAP: LazyLock<HashMap<&'static str, f64>> =
    LazyLock::new(|| INTENSIFIERS.iter().copied().collect());

/// Lexicon-based polarity scorer for short customer feedback.
#[derive(Debug, Clone)]
pub struct PolarityScorer {
    positive_threshold: f64,
    negative_threshold: f64,
}

impl Default for PolarityScorer {
    fn default() -> Self {
        Self::from_config(&SentimentConfig::default())
    }
}

impl PolarityScorer {
    pub fn from_config(config: &SentimentConfig) -> Self {
        Self {
            positive_threshold: config.positive_threshold,
            negative_threshold: config.negative_threshold,
        }
    }

    /// Mean polarity of the opinion words in `text`, in `-1.0..=1.0`.
    ///
    /// Text without any opinion words scores `0.0`.
    pub fn score(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let mut sum = 0.0;
        let mut opinions = 0usize;
        let mut multiplier = 1.0;
        let mut negated = false;

        for token in WORD_RE.find_iter(&lower).map(|m| m.as_str()) {
            if NEGATIONS.contains(&token) || token.ends_with("n't") {
                negated = true;
                continue;
            }
            if let Some(m) = INTENSIFIER_MAP.get(token) {
                multiplier *= m;
                continue;
            }
            if let Some(p) = LEXICON_MAP.get(token) {
                let mut value = p * multiplier;
                if negated {
                    value *= NEGATION_FACTOR;
                }
                sum += value.clamp(-1.0, 1.0);
                opinions += 1;
                multiplier = 1.0;
                negated = false;
            }
        }

        if opinions == 0 {
            0.0
        } else {
            (sum / opinions as f64).clamp(-1.0, 1.0)
        }
    }

    /// Classify `text` into a sentiment label using the configured cut-offs.
    pub fn classify(&self, text: &str) -> Sentiment {
        let polarity = self.score(text);
        if polarity >= self.positive_threshold {
            Sentiment::Positive
        } else if polarity <= self.negative_threshold {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}
