//! Outbound publishing of mapped records.
//!
//! This module provides:
//! - The backoff schedule applied between transient failures
//! - An async publisher targeting Notion directly or through Composio

pub mod publisher;
pub mod retry;

pub use publisher::{is_transient, PublishReceipt, Publisher, COMPOSIO_INSERT_ACTION};
