//! Error types for the action server.

use chaton_core::error::ChatonError;

/// Errors from action dispatch and handler execution.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Action not registered: {0}")]
    UnknownAction(String),
    #[error("Invalid action request: {0}")]
    InvalidRequest(String),
    #[error("Storage error: {0}")]
    Storage(#[from] ChatonError),
}
