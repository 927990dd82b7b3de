//! Web server module for handling inbound webhooks.
//!
//! This module provides:
//! - `POST /api/webhook`: signature-checked Smartlead receiver
//! - `GET /health`: static service status
//! - `GET /`: service banner

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, root, smartlead_webhook, AppState, HealthResponse, RootResponse, WebhookResponse,
    SERVICE_NAME,
};
pub use signature::{compute_signature, verify_signature, SIGNATURE_HEADER};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/webhook", post(smartlead_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
