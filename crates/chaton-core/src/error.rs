use thiserror::Error;

/// Top-level error type for ChatOn.
///
/// Subsystem crates wrap this in their own error enums via `#[from]` so the
/// `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Chat relay error: {0}")]
    Relay(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ChatonError {
    fn from(err: toml::de::Error) -> Self {
        ChatonError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ChatonError {
    fn from(err: toml::ser::Error) -> Self {
        ChatonError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ChatonError {
    fn from(err: serde_json::Error) -> Self {
        ChatonError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for ChatOn operations.
pub type Result<T> = std::result::Result<T, ChatonError>;
