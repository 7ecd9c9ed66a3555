//! Free-text product search over catalog descriptions.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::services::ActionServices;
use crate::types::{ActionContext, ActionName, ActionOutcome};

/// First `max_chars` characters of `description`, with `...` when cut.
fn snippet(description: &str, max_chars: usize) -> String {
    match description.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &description[..cut]),
        None => description.to_string(),
    }
}

pub struct SearchByDescriptionHandler {
    services: Arc<ActionServices>,
}

impl SearchByDescriptionHandler {
    pub fn new(services: Arc<ActionServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ActionHandler for SearchByDescriptionHandler {
    fn name(&self) -> ActionName {
        ActionName::SearchByDescription
    }

    async fn run(&self, ctx: &ActionContext) -> Result<ActionOutcome, ActionError> {
        let config = &self.services.search_config;
        let query = ctx.latest_text.trim();
        if query.chars().count() < config.min_query_chars {
            return Ok(ActionOutcome::reply(
                "Please describe what you're looking for in more detail.",
            ));
        }

        let hits = self
            .services
            .search
            .search_descriptions(query, config.result_limit)?;
        debug!(query = %query, hits = hits.len(), "Description search");

        if hits.is_empty() {
            return Ok(ActionOutcome::reply(
                "Sorry, I couldn't find any products matching your description.",
            ));
        }

        let mut message = String::from("Here are some products I found:\n");
        for hit in &hits {
            message.push_str(&format!(
                "\n• {}: {}",
                hit.product.name,
                snippet(&hit.product.description, config.snippet_chars)
            ));
        }

        Ok(ActionOutcome::reply(message)
            .say("Would you like more details about any of these products?"))
    }
}
