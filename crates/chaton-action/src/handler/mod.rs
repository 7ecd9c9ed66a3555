//! Action handler registry and trait definition.
//!
//! Defines the `ActionHandler` async trait and provides the handler
//! registry for dispatching actions to the correct implementation.

pub mod feedback;
pub mod product;
pub mod search;
pub mod shop;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use chaton_core::error::ChatonError;

use crate::error::ActionError;
use crate::services::ActionServices;
use crate::types::{ActionContext, ActionName, ActionOutcome, PRODUCT_SLOT};

/// Follow-up question sent after contact details and feedback summaries.
pub const ANYTHING_ELSE: &str = "Would you like to know anything else about this product?";

/// One named action the dialogue manager can invoke.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn name(&self) -> ActionName;

    async fn run(&self, ctx: &ActionContext) -> Result<ActionOutcome, ActionError>;
}

/// Reply for a product name that resolves to nothing; clears the slot.
pub(crate) fn not_found(product_name: &str) -> ActionOutcome {
    ActionOutcome::reply(format!(
        "Sorry, we don't have a product named '{}'.",
        product_name
    ))
    .clear_slot(PRODUCT_SLOT)
}

/// Maps action names to their handlers.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<ActionName, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one with the same name.
    pub fn register(&mut self, handler: Box<dyn ActionHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    /// Register every built-in handler against `services`.
    pub fn register_defaults(&mut self, services: Arc<ActionServices>) {
        use product::{AttributeHandler, AvailabilityHandler, PriceHandler, ProductAttribute};

        self.register(Box::new(AvailabilityHandler::new(Arc::clone(&services))));
        self.register(Box::new(PriceHandler::new(Arc::clone(&services))));
        for attribute in [
            ProductAttribute::Brand,
            ProductAttribute::Description,
            ProductAttribute::Size,
        ] {
            self.register(Box::new(AttributeHandler::new(
                Arc::clone(&services),
                attribute,
            )));
        }
        self.register(Box::new(shop::LocationHandler::new(Arc::clone(&services))));
        self.register(Box::new(shop::ContactHandler::new(Arc::clone(&services))));
        self.register(Box::new(feedback::StoreFeedbackHandler::new(Arc::clone(
            &services,
        ))));
        self.register(Box::new(feedback::FeedbackSummaryHandler::new(Arc::clone(
            &services,
        ))));
        self.register(Box::new(search::SearchByDescriptionHandler::new(services)));
    }

    pub fn get(&self, name: ActionName) -> Option<&dyn ActionHandler> {
        self.handlers.get(&name).map(|h| h.as_ref())
    }

    /// Registered action names in declaration order.
    pub fn names(&self) -> Vec<ActionName> {
        ActionName::ALL
            .into_iter()
            .filter(|name| self.handlers.contains_key(name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the action called `action` against `ctx`.
    ///
    /// Storage failures become a `Database error: ...` reply with no slot
    /// events; unknown names are returned as errors.
    pub async fn dispatch(
        &self,
        action: &str,
        ctx: &ActionContext,
    ) -> Result<ActionOutcome, ActionError> {
        let name: ActionName = action
            .parse()
            .map_err(|_| ActionError::UnknownAction(action.to_string()))?;
        let handler = self
            .get(name)
            .ok_or_else(|| ActionError::UnknownAction(action.to_string()))?;

        debug!(action = %name, sender = %ctx.sender_id, "Running action");
        match handler.run(ctx).await {
            Err(ActionError::Storage(err)) => {
                warn!(action = %name, error = %err, "Action failed on storage");
                let detail = match err {
                    ChatonError::Storage(msg) => msg,
                    other => other.to_string(),
                };
                Ok(ActionOutcome::reply(format!("Database error: {}", detail)))
            }
            other => other,
        }
    }
}
