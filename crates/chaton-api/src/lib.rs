//! ChatOn API crate - axum HTTP server and route handlers.
//!
//! Serves the action-server webhook the dialogue manager calls, the chat
//! relay used by the storefront widget, shop accounts and catalog
//! management, the admin overview, and health checks.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod relay;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
