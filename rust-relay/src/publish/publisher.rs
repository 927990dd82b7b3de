//! Async publisher that creates database rows.
//!
//! The publisher owns a pooled HTTP client and can be cloned cheaply
//! across request handlers. Each `publish` call makes up to
//! `RetryPolicy::max_attempts` attempts, backing off between transient
//! failures and giving up immediately on permanent ones.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header::HeaderMap, Client, StatusCode};
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::{Config, Destination, RetryPolicy};
use crate::error::PublishError;
use crate::notion::NotionRecord;

/// Composio action that inserts a row into a Notion database.
pub const COMPOSIO_INSERT_ACTION: &str = "NOTION_INSERT_ROW_DATABASE";

/// Upstream error bodies are cut to this many bytes before logging.
const ERROR_BODY_PREVIEW: usize = 500;

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Identifier of the created page, when the destination reports one
    pub page_id: Option<String>,
    /// Attempts it took, including the successful one
    pub attempts: u32,
}

/// Result of a single HTTP attempt.
enum Attempt {
    Created(Option<String>),
    Transient {
        reason: String,
        retry_after: Option<Duration>,
    },
    Permanent {
        status: u16,
        body: String,
    },
}

/// Record publisher with retry handling.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    client: Client,
    destination: Destination,
    database_id: String,
    retry: RetryPolicy,
}

impl Publisher {
    /// Create a publisher for the given destination and database.
    pub fn new(
        destination: Destination,
        database_id: String,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Client(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(PublisherInner {
                client,
                destination,
                database_id,
                retry,
            }),
        })
    }

    /// Create a publisher from application configuration.
    pub fn from_config(config: &Config) -> Result<Self, PublishError> {
        Self::new(
            config.destination.clone(),
            config.database_id.clone(),
            config.retry,
            config.request_timeout,
        )
    }

    pub fn destination(&self) -> &Destination {
        &self.inner.destination
    }

    /// Create one row for `record`, retrying transient failures.
    pub async fn publish(&self, record: &NotionRecord) -> Result<PublishReceipt, PublishError> {
        let body = self.request_body(record);
        let destination = self.inner.destination.name();
        let max_attempts = self.inner.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.send_once(&body).await? {
                Attempt::Created(page_id) => {
                    info!(
                        destination = destination,
                        event_id = record.title().unwrap_or_default(),
                        page_id = ?page_id,
                        attempt = attempt,
                        "notion_record_created"
                    );
                    return Ok(PublishReceipt {
                        page_id,
                        attempts: attempt,
                    });
                }
                Attempt::Permanent { status, body } => {
                    error!(
                        destination = destination,
                        status = status,
                        body_preview = %preview(&body),
                        attempt = attempt,
                        "notion_publish_rejected"
                    );
                    return Err(PublishError::Rejected { status, body });
                }
                Attempt::Transient {
                    reason,
                    retry_after,
                } => {
                    if attempt >= max_attempts {
                        error!(
                            destination = destination,
                            attempts = attempt,
                            reason = %reason,
                            "notion_publish_exhausted"
                        );
                        return Err(PublishError::Exhausted {
                            attempts: attempt,
                            last: reason,
                        });
                    }

                    let delay = self.inner.retry.next_delay(attempt, retry_after);
                    warn!(
                        destination = destination,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "notion_publish_retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    fn endpoint(&self) -> String {
        match &self.inner.destination {
            Destination::Notion { base_url, .. } => format!("{}/v1/pages", base_url),
            Destination::Composio { base_url, .. } => {
                format!("{}/v1/actions/{}", base_url, COMPOSIO_INSERT_ACTION)
            }
        }
    }

    fn request_body(&self, record: &NotionRecord) -> Value {
        match &self.inner.destination {
            Destination::Notion { .. } => json!({
                "parent": { "database_id": self.inner.database_id },
                "properties": record.page_properties(),
            }),
            Destination::Composio { .. } => json!({
                "database_id": self.inner.database_id,
                "properties": record.composio_properties(),
            }),
        }
    }

    /// Composio only confirms execution with 200 or 201.
    fn is_created(&self, status: StatusCode) -> bool {
        match self.inner.destination {
            Destination::Notion { .. } => status.is_success(),
            Destination::Composio { .. } => {
                status == StatusCode::OK || status == StatusCode::CREATED
            }
        }
    }

    async fn send_once(&self, body: &Value) -> Result<Attempt, PublishError> {
        let request = match &self.inner.destination {
            Destination::Notion {
                api_key, version, ..
            } => self
                .inner
                .client
                .post(self.endpoint())
                .bearer_auth(api_key)
                .header("Notion-Version", version.as_str()),
            Destination::Composio { api_key, .. } => {
                self.inner.client.post(self.endpoint()).bearer_auth(api_key)
            }
        };

        let response = match request.json(body).send().await {
            Ok(resp) => resp,
            Err(e) if e.is_builder() => return Err(PublishError::Client(e.to_string())),
            Err(e) => {
                let kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connect"
                } else {
                    "transport"
                };
                return Ok(Attempt::Transient {
                    reason: format!("{} error: {}", kind, e),
                    retry_after: None,
                });
            }
        };

        let status = response.status();

        if self.is_created(status) {
            let page_id = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| extract_page_id(&v));
            return Ok(Attempt::Created(page_id));
        }

        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        if is_transient(status) {
            Ok(Attempt::Transient {
                reason: format!("status {}", status.as_u16()),
                retry_after,
            })
        } else {
            Ok(Attempt::Permanent {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Rate limiting, request timeouts and server errors are worth retrying.
pub fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Read a delta-seconds `Retry-After` header.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Notion returns the page at the top level; Composio nests it.
fn extract_page_id(body: &Value) -> Option<String> {
    ["/id", "/data/id", "/response_data/id"]
        .iter()
        .find_map(|p| body.pointer(p))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(ERROR_BODY_PREVIEW);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
