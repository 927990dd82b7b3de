//! Error taxonomy for the webhook pipeline.
//!
//! Every failure is terminal for the current request and maps to exactly
//! one HTTP status. Response bodies carry a short reason only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Signature check failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("signature header is missing")]
    MissingSignature,

    #[error("signature is not valid hex")]
    MalformedSignature,

    #[error("signature does not match payload")]
    InvalidSignature,
}

/// An inbound field that could not be coerced to its target property type.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("property `{field}` {reason}")]
pub struct MappingError {
    /// Name of the target property
    pub field: &'static str,
    pub reason: String,
}

impl MappingError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Outbound record creation failures.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Non-transient rejection, never retried.
    #[error("destination rejected record with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Every attempt hit a transient failure.
    #[error("gave up after {attempts} attempts, last failure: {last}")]
    Exhausted { attempts: u32, last: String },

    /// The request could not be built or its response not understood.
    #[error("destination client error: {0}")]
    Client(String),
}

/// Anything that ends a webhook request early.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Auth(_) => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidJson(_) | WebhookError::Mapping(_) => StatusCode::BAD_REQUEST,
            WebhookError::Publish(PublishError::Exhausted { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            WebhookError::Publish(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Client-facing reason string.
    pub fn reason(&self) -> String {
        match self {
            WebhookError::Auth(AuthError::MissingSignature) => "Missing signature".to_string(),
            WebhookError::Auth(_) => "Invalid signature".to_string(),
            WebhookError::InvalidJson(_) => "Invalid JSON".to_string(),
            WebhookError::Mapping(e) => format!("Unmappable field: {}", e.field),
            WebhookError::Publish(PublishError::Exhausted { .. }) => {
                "Destination unavailable".to_string()
            }
            WebhookError::Publish(_) => "Destination rejected event".to_string(),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub detail: String,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "webhook_failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "webhook_rejected");
        }

        (
            status,
            Json(ErrorResponse {
                status: "error",
                detail: self.reason(),
            }),
        )
            .into_response()
    }
}
