//! Product lookup handlers: availability, price, brand, description, size.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use chaton_core::types::Product;

use crate::error::ActionError;
use crate::handler::{not_found, ActionHandler};
use crate::services::ActionServices;
use crate::types::{ActionContext, ActionName, ActionOutcome, PRODUCT_SLOT};

/// Format a price the way customers expect to read it: `20.0`, `9.99`.
fn format_price(price: f64) -> String {
    if price.is_finite() && price.fract() == 0.0 {
        format!("{:.1}", price)
    } else {
        price.to_string()
    }
}

/// Answers "do you have X?" with the first catalog match.
pub struct AvailabilityHandler {
    services: Arc<ActionServices>,
}

impl AvailabilityHandler {
    pub fn new(services: Arc<ActionServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ActionHandler for AvailabilityHandler {
    fn name(&self) -> ActionName {
        ActionName::CheckAvailability
    }

    async fn run(&self, ctx: &ActionContext) -> Result<ActionOutcome, ActionError> {
        let Some(product_name) = ctx.product_name() else {
            return Ok(ActionOutcome::reply(
                "sorry we don't have any product like that/n do you want any other product?",
            ));
        };

        match self.services.find_product(&product_name)? {
            Some(product) => {
                info!(query = %product_name, product_id = product.id, "Product available");
                Ok(ActionOutcome::reply(format!("The '{}' is available.", product_name))
                    .offer_more()
                    .set_slot(PRODUCT_SLOT, product_name))
            }
            None => Ok(not_found(&product_name)),
        }
    }
}

/// Quotes the price of the first catalog match.
pub struct PriceHandler {
    services: Arc<ActionServices>,
}

impl PriceHandler {
    pub fn new(services: Arc<ActionServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ActionHandler for PriceHandler {
    fn name(&self) -> ActionName {
        ActionName::GettingPrice
    }

    async fn run(&self, ctx: &ActionContext) -> Result<ActionOutcome, ActionError> {
        let Some(product_name) = ctx.product_name() else {
            return Ok(ActionOutcome::reply("sorry we don't have any product like that"));
        };

        match self.services.find_product(&product_name)? {
            Some(product) => Ok(ActionOutcome::reply(format!(
                "The price of '{}' is {}.",
                product.name,
                format_price(product.price)
            ))
            .offer_more()
            .set_slot(PRODUCT_SLOT, product.name)),
            None => Ok(not_found(&product_name)),
        }
    }
}

/// Product column reported by an [`AttributeHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductAttribute {
    Brand,
    Description,
    Size,
}

impl ProductAttribute {
    fn action(&self) -> ActionName {
        match self {
            ProductAttribute::Brand => ActionName::GettingBrand,
            ProductAttribute::Description => ActionName::GettingDescription,
            ProductAttribute::Size => ActionName::GettingSize,
        }
    }

    fn value<'a>(&self, product: &'a Product) -> &'a str {
        match self {
            ProductAttribute::Brand => &product.brand,
            ProductAttribute::Description => &product.description,
            ProductAttribute::Size => &product.size,
        }
    }

    fn sentence(&self, product_name: &str, joined: &str) -> String {
        match self {
            ProductAttribute::Brand => format!("Brand(s) for '{}': {}.", product_name, joined),
            ProductAttribute::Description => format!("Description(s): {}.", joined),
            ProductAttribute::Size => format!("Size(s): {}.", joined),
        }
    }
}

/// Lists one attribute of every matching product, tagged with its shop.
pub struct AttributeHandler {
    services: Arc<ActionServices>,
    attribute: ProductAttribute,
}

impl AttributeHandler {
    pub fn new(services: Arc<ActionServices>, attribute: ProductAttribute) -> Self {
        Self {
            services,
            attribute,
        }
    }
}

#[async_trait]
impl ActionHandler for AttributeHandler {
    fn name(&self) -> ActionName {
        self.attribute.action()
    }

    async fn run(&self, ctx: &ActionContext) -> Result<ActionOutcome, ActionError> {
        let Some(product_name) = ctx.product_name() else {
            return Ok(ActionOutcome::reply("Please provide the product name."));
        };

        let matches = self.services.find_products(&product_name)?;
        if matches.is_empty() {
            return Ok(not_found(&product_name));
        }

        let joined = matches
            .iter()
            .map(|p| format!("User {}: {}", p.owner_id, self.attribute.value(p)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(
            ActionOutcome::reply(self.attribute.sentence(&product_name, &joined))
                .offer_more()
                .set_slot(PRODUCT_SLOT, product_name),
        )
    }
}
