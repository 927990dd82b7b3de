//! Smartlead event types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Campaign events Smartlead reports via webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    EmailSent,
    EmailOpened,
    LinkClicked,
    ReplyReceived,
    Bounced,
    Unsubscribed,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::EmailSent,
        EventType::EmailOpened,
        EventType::LinkClicked,
        EventType::ReplyReceived,
        EventType::Bounced,
        EventType::Unsubscribed,
    ];

    /// Wire name as Smartlead sends it.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::EmailSent => "EMAIL_SENT",
            EventType::EmailOpened => "EMAIL_OPENED",
            EventType::LinkClicked => "LINK_CLICKED",
            EventType::ReplyReceived => "REPLY_RECEIVED",
            EventType::Bounced => "BOUNCED",
            EventType::Unsubscribed => "UNSUBSCRIBED",
        }
    }

    /// Option name in the database's `Event Type` select.
    pub fn select_option(&self) -> &'static str {
        match self {
            EventType::EmailSent => "Sent",
            EventType::EmailOpened => "Opened",
            EventType::LinkClicked => "Clicked",
            EventType::ReplyReceived => "Replied",
            EventType::Bounced => "Bounced",
            EventType::Unsubscribed => "Unsubscribed",
        }
    }

    /// Match a wire name, ignoring case and surrounding whitespace.
    pub fn from_wire(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire() {
        assert_eq!(EventType::from_wire("EMAIL_OPENED"), Some(EventType::EmailOpened));
        assert_eq!(EventType::from_wire(" link_clicked "), Some(EventType::LinkClicked));
        assert_eq!(EventType::from_wire("LEAD_CATEGORY_UPDATED"), None);
        assert_eq!(EventType::from_wire(""), None);
    }

    #[test]
    fn test_wire_names_roundtrip_through_serde() {
        for t in EventType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn test_select_options_are_distinct() {
        let mut options: Vec<_> = EventType::ALL.iter().map(|t| t.select_option()).collect();
        options.sort();
        options.dedup();
        assert_eq!(options.len(), EventType::ALL.len());
    }
}
