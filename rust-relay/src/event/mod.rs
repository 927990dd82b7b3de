//! Inbound Smartlead event handling.
//!
//! ## Mapping Flow
//!
//! ```text
//! raw JSON → map_event() → NotionRecord
//! ```

pub mod mapper;
pub mod timestamp;
pub mod types;

pub use mapper::{event_id, map_event, PROPERTY_NAMES};
pub use timestamp::{coerce_timestamp, parse_timestamp};
pub use types::EventType;
