//! Feedback handlers: recording customer feedback and summarizing it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use chaton_core::sentiment::aggregate;
use chaton_core::types::{NewFeedback, Sentiment};

use crate::error::ActionError;
use crate::handler::{not_found, ActionHandler, ANYTHING_ELSE};
use crate::services::ActionServices;
use crate::types::{ActionContext, ActionName, ActionOutcome, PRODUCT_SLOT, SENTIMENT_SLOT};

/// Stores the latest message as feedback for the current product.
///
/// The name is saved as the customer gave it and linked to a catalog row
/// only on an exact match. A valid `sentiment` slot is used as-is;
/// otherwise the text is scored.
pub struct StoreFeedbackHandler {
    services: Arc<ActionServices>,
}

impl StoreFeedbackHandler {
    pub fn new(services: Arc<ActionServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ActionHandler for StoreFeedbackHandler {
    fn name(&self) -> ActionName {
        ActionName::StoreFeedback
    }

    async fn run(&self, ctx: &ActionContext) -> Result<ActionOutcome, ActionError> {
        let text = ctx.latest_text.trim();
        let (Some(product_name), false) = (ctx.product_name(), text.is_empty()) else {
            return Ok(ActionOutcome::reply(
                "Please provide the product name and your feedback.",
            ));
        };

        let sentiment = ctx
            .slot(SENTIMENT_SLOT)
            .and_then(|s| s.parse::<Sentiment>().ok())
            .unwrap_or_else(|| self.services.scorer.classify(text));

        // Only an exact name links the row to a catalog product.
        let product_id = self.services.find_exact(&product_name)?.map(|p| p.id);
        let name = product_name;

        let id = self.services.feedback.insert(&NewFeedback {
            product_id,
            product_name: name.clone(),
            text: text.to_string(),
            sentiment,
        })?;
        info!(feedback_id = id, product = %name, %sentiment, "Feedback recorded");

        Ok(ActionOutcome::reply(format!(
            "Thank you! Your feedback for '{}' has been recorded.",
            name
        ))
        .set_slot(PRODUCT_SLOT, name)
        .clear_slot(SENTIMENT_SLOT))
    }
}

/// Summarizes the sentiment of all feedback recorded for a product.
pub struct FeedbackSummaryHandler {
    services: Arc<ActionServices>,
}

impl FeedbackSummaryHandler {
    pub fn new(services: Arc<ActionServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ActionHandler for FeedbackSummaryHandler {
    fn name(&self) -> ActionName {
        ActionName::QueryFeedbackSummary
    }

    async fn run(&self, ctx: &ActionContext) -> Result<ActionOutcome, ActionError> {
        let Some(product_name) = ctx.product_name() else {
            return Ok(ActionOutcome::reply("Please provide the product name."));
        };

        let catalog_match = match self.services.find_exact(&product_name)? {
            Some(product) => Some(product),
            None => self.services.find_product(&product_name)?,
        };
        let name = catalog_match
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| product_name.clone());

        let rows = self.services.feedback.list_for_product(&name)?;
        if catalog_match.is_none() && rows.is_empty() {
            return Ok(not_found(&product_name));
        }

        let summary = aggregate(&rows);
        info!(product = %name, label = %summary.label, total = rows.len(), "Feedback summarized");

        Ok(ActionOutcome::reply(summary.describe(&name))
            .say(ANYTHING_ELSE)
            .set_slot(PRODUCT_SLOT, name))
    }
}
