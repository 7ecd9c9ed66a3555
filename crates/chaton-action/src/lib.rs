//! Action server for ChatOn.
//!
//! Answers the dialogue manager's action calls: product lookups, shop
//! details, feedback capture and summaries, and description search. Each
//! call carries its own conversation context and returns slot updates as
//! events.

pub mod error;
pub mod handler;
pub mod services;
pub mod types;

pub use error::ActionError;
pub use handler::{ActionHandler, ActionRegistry};
pub use services::ActionServices;
pub use types::{
    ActionContext, ActionName, ActionOutcome, BotMessage, Entity, SlotEvent, PRODUCT_SLOT,
    SENTIMENT_SLOT,
};
