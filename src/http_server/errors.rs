//! Gateway errors and their HTTP mapping
//!
//! Response body is always `{"error": "<message>"}`. Server-side failures
//! (corruption, disk, decode) carry a generic message; the detail is logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::observability::Logger;
use crate::store::StoreError;

/// Result type for handlers
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Unreadable body or malformed query string
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid request method")]
    MethodNotAllowed,

    #[error("Server is busy")]
    ServerBusy,

    /// Blocking task panicked or was cancelled
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Store(err) => match err {
                StoreError::InvalidFilename(_) => StatusCode::BAD_REQUEST,
                StoreError::SchemaValidationFailed(_) => StatusCode::BAD_REQUEST,
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::Decode(_) | StoreError::Integrity(_) | StoreError::Io { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::ServerBusy => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::Store(StoreError::InvalidFilename(_)) => "Invalid filename".to_string(),
            GatewayError::Store(StoreError::NotFound(_)) => "File not found".to_string(),
            GatewayError::Store(StoreError::SchemaValidationFailed(err)) => {
                format!("Validation failed: {}", err.message())
            }
            _ if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR => {
                "Server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            let detail = self.to_string();
            Logger::error("REQUEST_FAILED", &[("error", detail.as_str())]);
        }
        let body = Json(ErrorResponse {
            error: self.public_message(),
        });
        (status, body).into_response()
    }
}
