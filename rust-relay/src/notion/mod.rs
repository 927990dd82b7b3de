//! Notion record model.
//!
//! Records are built by the event mapper and encoded for whichever
//! destination the publisher is configured with.

pub mod record;

pub use record::{ComposioProperty, NotionRecord, Property, PropertyValue, TEXT_CONTENT_LIMIT};
