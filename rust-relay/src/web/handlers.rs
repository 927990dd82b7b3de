//! Webhook endpoint handlers.
//!
//! The webhook handler runs the whole pipeline inline:
//! 1. Verify the body signature
//! 2. Parse and map the event
//! 3. Publish the record, retrying transient failures
//! 4. Respond with the outcome

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::WebhookError;
use crate::event::map_event;
use crate::publish::Publisher;
use crate::web::signature::{verify_signature, SIGNATURE_HEADER};
use crate::Config;

/// Human-readable service name reported by `/health` and `/`.
pub const SERVICE_NAME: &str = "Smartlead → Notion Webhook Handler";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub publisher: Publisher,
}

impl AppState {
    pub fn new(config: Config, publisher: Publisher) -> Self {
        Self {
            config: Arc::new(config),
            publisher,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database_id: String,
}

/// Health check endpoint. Independent of the webhook pipeline.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        timestamp: Utc::now(),
        database_id: state.config.database_id.clone(),
    })
}

/// Service banner.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub health: &'static str,
    pub webhook: &'static str,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: SERVICE_NAME,
        health: "/health",
        webhook: "/api/webhook",
    })
}

// =============================================================================
// Smartlead Webhook
// =============================================================================

/// Webhook success response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub event_id: String,
    pub page_id: Option<String>,
}

/// Smartlead webhook endpoint.
///
/// The body is taken as raw bytes so the signature is checked against
/// exactly what was sent.
pub async fn smartlead_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    info!(
        body_length = body.len(),
        has_signature = !signature.is_empty(),
        "smartlead_webhook_received"
    );

    verify_signature(&state.config.webhook_secret, &body, signature)?;

    let event: Value =
        serde_json::from_slice(&body).map_err(|e| WebhookError::InvalidJson(e.to_string()))?;

    if !event.is_object() {
        return Err(WebhookError::InvalidJson(
            "payload is not a JSON object".to_string(),
        ));
    }

    info!(
        event = ?event.get("event").or_else(|| event.get("event_type")),
        campaign = ?event.get("campaign").or_else(|| event.get("campaign_id")),
        "smartlead_event_parsed"
    );

    let record = map_event(&event, Utc::now())?;
    let event_id = record.title().unwrap_or_default().to_string();

    let receipt = state.publisher.publish(&record).await?;

    info!(
        event_id = %event_id,
        page_id = ?receipt.page_id,
        attempts = receipt.attempts,
        destination = state.publisher.destination().name(),
        "smartlead_event_forwarded"
    );

    Ok(Json(WebhookResponse {
        status: "success",
        message: "Event inserted into Notion",
        event_id,
        page_id: receipt.page_id,
    }))
}
