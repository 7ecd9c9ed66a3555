//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping internal errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use chaton_action::ActionError;
use chaton_core::error::ChatonError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Action name echoed back when the action server cannot run it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid fields.
    BadRequest(String),
    /// 401 Unauthorized - bad credentials or no session.
    Unauthorized(String),
    /// 403 Forbidden - session lacks the required role.
    Forbidden(String),
    /// 404 Not Found - resource does not exist or is not yours.
    NotFound(String),
    /// 404 Not Found - the action server has no handler with this name.
    ActionNotFound(String),
    /// 409 Conflict - e.g. username already taken.
    Conflict(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - the dialogue server failed.
    BadGateway(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut action_name = None;
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::ActionNotFound(name) => {
                let msg = format!("No registered action found for name '{}'.", name);
                action_name = Some(name);
                (StatusCode::NOT_FOUND, "action_not_found", msg)
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            action_name,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatonError> for ApiError {
    fn from(err: ChatonError) -> Self {
        match err {
            ChatonError::Validation(msg) => ApiError::BadRequest(msg),
            ChatonError::Conflict(msg) => ApiError::Conflict(msg),
            ChatonError::Auth(msg) => ApiError::Unauthorized(msg),
            ChatonError::Relay(msg) => ApiError::BadGateway(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ActionError> for ApiError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::UnknownAction(name) => ApiError::ActionNotFound(name),
            ActionError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            ActionError::Storage(e) => e.into(),
        }
    }
}
