//! Smartlead → Notion relay.
//!
//! Receives Smartlead campaign webhooks, verifies their HMAC signature,
//! maps each event to a Notion database row and creates it, either
//! directly through the Notion API or through Composio.
//!
//! ## Architecture
//!
//! ```text
//! Smartlead → POST /api/webhook → verify → map_event → Publisher → Notion
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod notion;
pub mod publish;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError, Destination, RetryPolicy};
pub use error::{AuthError, MappingError, PublishError, WebhookError};
pub use event::{map_event, EventType};
pub use notion::{NotionRecord, PropertyValue};
pub use publish::{PublishReceipt, Publisher};
pub use web::{router, AppState};
