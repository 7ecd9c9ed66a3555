//! ChatOn core: configuration, errors, domain types, fuzzy product
//! resolution and feedback sentiment.

pub mod config;
pub mod error;
pub mod matching;
pub mod sentiment;
pub mod types;

pub use config::ChatonConfig;
pub use error::{ChatonError, Result};
pub use matching::{resolve, resolve_first, similarity, CatalogName, ProductResolver};
pub use sentiment::{aggregate, FeedbackSummary, PolarityScorer, SentimentCounts, SummaryLabel};
pub use types::*;
