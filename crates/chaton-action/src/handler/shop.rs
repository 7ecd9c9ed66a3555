//! Shop lookup handlers: where a product is sold and how to reach the seller.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::handler::{not_found, ActionHandler, ANYTHING_ELSE};
use crate::services::ActionServices;
use crate::types::{ActionContext, ActionName, ActionOutcome, PRODUCT_SLOT};

pub struct LocationHandler {
    services: Arc<ActionServices>,
}

impl LocationHandler {
    pub fn new(services: Arc<ActionServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ActionHandler for LocationHandler {
    fn name(&self) -> ActionName {
        ActionName::GettingLocation
    }

    async fn run(&self, ctx: &ActionContext) -> Result<ActionOutcome, ActionError> {
        let Some(product_name) = ctx.product_name() else {
            return Ok(ActionOutcome::reply("we don't have a relevent product."));
        };
        let Some(product) = self.services.find_product(&product_name)? else {
            return Ok(not_found(&product_name));
        };

        let address = self
            .services
            .users
            .contact_for(product.owner_id)?
            .and_then(|c| c.shop_address);

        let outcome = match address {
            Some(address) => {
                ActionOutcome::reply(format!("The shop location is: {}", address)).offer_more()
            }
            None => ActionOutcome::reply("No shop address found."),
        };
        Ok(outcome.set_slot(PRODUCT_SLOT, product.name))
    }
}

pub struct ContactHandler {
    services: Arc<ActionServices>,
}

impl ContactHandler {
    pub fn new(services: Arc<ActionServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ActionHandler for ContactHandler {
    fn name(&self) -> ActionName {
        ActionName::GettingContact
    }

    async fn run(&self, ctx: &ActionContext) -> Result<ActionOutcome, ActionError> {
        let Some(product_name) = ctx.product_name() else {
            return Ok(ActionOutcome::reply("Please provide the product name."));
        };
        let Some(product) = self.services.find_product(&product_name)? else {
            return Ok(not_found(&product_name));
        };

        let contact = self
            .services
            .users
            .contact_for(product.owner_id)?
            .filter(|c| c.contact_email.is_some() || c.phone_number.is_some());

        let outcome = match contact {
            Some(contact) => {
                let mut msg = String::from("Contact info:\n");
                if let Some(email) = &contact.contact_email {
                    msg.push_str(&format!("- Email: {}\n", email));
                }
                if let Some(phone) = &contact.phone_number {
                    msg.push_str(&format!("- Phone: {}", phone));
                }
                ActionOutcome::reply(msg.trim()).say(ANYTHING_ELSE)
            }
            None => ActionOutcome::reply("No contact information found."),
        };
        Ok(outcome.set_slot(PRODUCT_SLOT, product.name))
    }
}
