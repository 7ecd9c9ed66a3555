//! Core types for the action server.
//!
//! Defines the action names the dialogue manager may call, the per-request
//! conversation context handed to a handler, and the outcome a handler returns.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Slot holding the product the conversation is about.
pub const PRODUCT_SLOT: &str = "product_name";
/// Slot holding a pre-classified feedback sentiment.
pub const SENTIMENT_SLOT: &str = "sentiment";
/// Template response asking whether the customer wants more.
pub const OFFER_MORE_OPTIONS: &str = "utter_offer_more_options";

// =============================================================================
// Action names
// =============================================================================

/// Actions served by this action server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    CheckAvailability,
    GettingPrice,
    GettingBrand,
    GettingDescription,
    GettingSize,
    GettingLocation,
    GettingContact,
    StoreFeedback,
    QueryFeedbackSummary,
    SearchByDescription,
}

impl ActionName {
    pub const ALL: [ActionName; 10] = [
        ActionName::CheckAvailability,
        ActionName::GettingPrice,
        ActionName::GettingBrand,
        ActionName::GettingDescription,
        ActionName::GettingSize,
        ActionName::GettingLocation,
        ActionName::GettingContact,
        ActionName::StoreFeedback,
        ActionName::QueryFeedbackSummary,
        ActionName::SearchByDescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::CheckAvailability => "action_check_availability",
            ActionName::GettingPrice => "action_getting_price",
            ActionName::GettingBrand => "action_getting_brand",
            ActionName::GettingDescription => "action_getting_description",
            ActionName::GettingSize => "action_getting_size",
            ActionName::GettingLocation => "action_getting_location",
            ActionName::GettingContact => "action_getting_contact",
            ActionName::StoreFeedback => "action_store_feedback",
            ActionName::QueryFeedbackSummary => "action_query_feedback_summary",
            ActionName::SearchByDescription => "action_search_by_description",
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionName {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("Unknown action: {}", s))
    }
}

// =============================================================================
// Request context
// =============================================================================

/// An entity extracted by the NLU from the latest user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Everything a handler may read about the conversation.
///
/// Built fresh for each request; slot changes travel back as [`SlotEvent`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionContext {
    pub sender_id: String,
    pub latest_text: String,
    pub entities: Vec<Entity>,
    pub slots: HashMap<String, serde_json::Value>,
}

impl ActionContext {
    pub fn new(sender_id: impl Into<String>, latest_text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            latest_text: latest_text.into(),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: &str, value: &str) -> Self {
        self.entities.push(Entity {
            entity: entity.to_string(),
            value: serde_json::Value::String(value.to_string()),
        });
        self
    }

    pub fn with_slot(mut self, name: &str, value: &str) -> Self {
        self.slots.insert(
            name.to_string(),
            serde_json::Value::String(value.to_string()),
        );
        self
    }

    /// Value of the first entity called `name`.
    pub fn entity(&self, name: &str) -> Option<&str> {
        self.entities
            .iter()
            .find(|e| e.entity == name)
            .and_then(|e| e.value.as_str())
    }

    /// String value of slot `name`; null and non-string values read as unset.
    pub fn slot(&self, name: &str) -> Option<&str> {
        self.slots.get(name).and_then(|v| v.as_str())
    }

    /// The product this turn is about: the `product_name` entity if the NLU
    /// found one, else the slot. Trimmed, lower-cased, never empty.
    pub fn product_name(&self) -> Option<String> {
        self.entity(PRODUCT_SLOT)
            .or_else(|| self.slot(PRODUCT_SLOT))
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
    }
}

// =============================================================================
// Handler outcome
// =============================================================================

/// A message sent back to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BotMessage {
    Text { text: String },
    Template { response: String },
}

impl BotMessage {
    pub fn text(text: impl Into<String>) -> Self {
        BotMessage::Text { text: text.into() }
    }

    pub fn offer_more_options() -> Self {
        BotMessage::Template {
            response: OFFER_MORE_OPTIONS.to_string(),
        }
    }

    /// Plain text of the message, `None` for templates.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            BotMessage::Text { text } => Some(text),
            BotMessage::Template { .. } => None,
        }
    }
}

/// A slot update returned to the dialogue manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotEvent {
    pub event: String,
    pub name: String,
    pub value: Option<String>,
}

impl SlotEvent {
    pub fn set(name: &str, value: impl Into<String>) -> Self {
        Self {
            event: "slot".to_string(),
            name: name.to_string(),
            value: Some(value.into()),
        }
    }

    pub fn clear(name: &str) -> Self {
        Self {
            event: "slot".to_string(),
            name: name.to_string(),
            value: None,
        }
    }
}

/// Messages and slot events produced by one handler run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    pub messages: Vec<BotMessage>,
    pub events: Vec<SlotEvent>,
}

impl ActionOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single text message and no events.
    pub fn reply(text: impl Into<String>) -> Self {
        Self::new().say(text)
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.messages.push(BotMessage::text(text));
        self
    }

    pub fn offer_more(mut self) -> Self {
        self.messages.push(BotMessage::offer_more_options());
        self
    }

    pub fn set_slot(mut self, name: &str, value: impl Into<String>) -> Self {
        self.events.push(SlotEvent::set(name, value));
        self
    }

    pub fn clear_slot(mut self, name: &str) -> Self {
        self.events.push(SlotEvent::clear(name));
        self
    }

    /// Text of every plain message, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().filter_map(BotMessage::as_text).collect()
    }
}
