//! Outbound record types and their wire encodings.
//!
//! A `NotionRecord` is an ordered list of named, typed property values.
//! It can be encoded either as a Notion `properties` object for the pages
//! API, or as the flat `{name, type, value}` list Composio's row-insert
//! action expects.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Maximum characters Notion accepts in a single text object.
pub const TEXT_CONTENT_LIMIT: usize = 2000;

/// A typed Notion property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    Date(Option<DateTime<FixedOffset>>),
    Select(Option<String>),
    Email(Option<String>),
    Url(Option<String>),
}

impl PropertyValue {
    /// Title value, truncated to the Notion text limit.
    pub fn title(text: impl Into<String>) -> Self {
        PropertyValue::Title(truncate_chars(text.into(), TEXT_CONTENT_LIMIT))
    }

    /// Rich text value, truncated to the Notion text limit.
    pub fn rich_text(text: impl Into<String>) -> Self {
        PropertyValue::RichText(truncate_chars(text.into(), TEXT_CONTENT_LIMIT))
    }

    /// Notion property type name.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Title(_) => "title",
            PropertyValue::RichText(_) => "rich_text",
            PropertyValue::Date(_) => "date",
            PropertyValue::Select(_) => "select",
            PropertyValue::Email(_) => "email",
            PropertyValue::Url(_) => "url",
        }
    }

    /// Whether the value carries any content.
    pub fn is_populated(&self) -> bool {
        match self {
            PropertyValue::Title(s) | PropertyValue::RichText(s) => !s.is_empty(),
            PropertyValue::Date(d) => d.is_some(),
            PropertyValue::Select(s) | PropertyValue::Email(s) | PropertyValue::Url(s) => {
                s.is_some()
            }
        }
    }

    /// Encode as a Notion property value object.
    pub fn to_notion(&self) -> Value {
        match self {
            PropertyValue::Title(s) => json!({ "title": text_array(s) }),
            PropertyValue::RichText(s) => json!({ "rich_text": text_array(s) }),
            PropertyValue::Date(Some(d)) => json!({ "date": { "start": d.to_rfc3339() } }),
            PropertyValue::Date(None) => json!({ "date": null }),
            PropertyValue::Select(Some(name)) => json!({ "select": { "name": name } }),
            PropertyValue::Select(None) => json!({ "select": null }),
            PropertyValue::Email(v) => json!({ "email": v }),
            PropertyValue::Url(v) => json!({ "url": v }),
        }
    }

    /// Encode as the scalar Composio expects in its `value` slot.
    pub fn to_scalar(&self) -> Value {
        match self {
            PropertyValue::Title(s) | PropertyValue::RichText(s) => Value::String(s.clone()),
            PropertyValue::Date(d) => d
                .map(|d| Value::String(d.to_rfc3339()))
                .unwrap_or(Value::Null),
            PropertyValue::Select(v) | PropertyValue::Email(v) | PropertyValue::Url(v) => v
                .as_ref()
                .map(|s| Value::String(s.clone()))
                .unwrap_or(Value::Null),
        }
    }
}

fn text_array(content: &str) -> Value {
    if content.is_empty() {
        return json!([]);
    }
    json!([{ "type": "text", "text": { "content": content } }])
}

/// Truncate to at most `limit` characters without splitting a code point.
fn truncate_chars(mut text: String, limit: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(limit) {
        text.truncate(idx);
    }
    text
}

/// A named property within a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: &'static str,
    pub value: PropertyValue,
}

/// One property in Composio's row-insert payload.
#[derive(Debug, Clone, Serialize)]
pub struct ComposioProperty {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: Value,
}

/// A database row ready to be created.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotionRecord {
    properties: Vec<Property>,
}

impl NotionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a property. Names are expected to be unique; `get` returns
    /// the first match.
    pub fn push(&mut self, name: &'static str, value: PropertyValue) {
        self.properties.push(Property { name, value });
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Content of the first title property.
    pub fn title(&self) -> Option<&str> {
        self.properties.iter().find_map(|p| match &p.value {
            PropertyValue::Title(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Notion pages API `properties` object.
    pub fn page_properties(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .map(|p| (p.name.to_string(), p.value.to_notion()))
            .collect()
    }

    /// Composio row-insert `properties` list.
    pub fn composio_properties(&self) -> Vec<ComposioProperty> {
        self.properties
            .iter()
            .map(|p| ComposioProperty {
                name: p.name,
                kind: p.value.kind(),
                value: p.value.to_scalar(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> NotionRecord {
        let when = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 15, 10, 30, 0)
            .unwrap();

        let mut record = NotionRecord::new();
        record.push("Event ID", PropertyValue::title("camp_1_a@b_com_20250115103000"));
        record.push("Event Type", PropertyValue::Select(Some("Opened".to_string())));
        record.push("Timestamp", PropertyValue::Date(Some(when)));
        record.push("Reply Timestamp", PropertyValue::Date(None));
        record.push("Company", PropertyValue::rich_text(""));
        record.push("Email", PropertyValue::Email(Some("a@b.com".to_string())));
        record.push("Link", PropertyValue::Url(None));
        record
    }

    #[test]
    fn test_page_properties_shape() {
        let props = Value::Object(sample().page_properties());

        assert_eq!(
            props["Event ID"],
            json!({ "title": [{ "type": "text", "text": { "content": "camp_1_a@b_com_20250115103000" } }] })
        );
        assert_eq!(props["Event Type"], json!({ "select": { "name": "Opened" } }));
        assert_eq!(
            props["Timestamp"],
            json!({ "date": { "start": "2025-01-15T10:30:00+00:00" } })
        );
        assert_eq!(props["Reply Timestamp"], json!({ "date": null }));
        assert_eq!(props["Company"], json!({ "rich_text": [] }));
        assert_eq!(props["Email"], json!({ "email": "a@b.com" }));
        assert_eq!(props["Link"], json!({ "url": null }));
    }

    #[test]
    fn test_composio_properties_preserve_order() {
        let rows = sample().composio_properties();
        let json = serde_json::to_value(&rows).unwrap();

        assert_eq!(rows.len(), 7);
        assert_eq!(
            json[0],
            json!({ "name": "Event ID", "type": "title", "value": "camp_1_a@b_com_20250115103000" })
        );
        assert_eq!(json[2]["value"], "2025-01-15T10:30:00+00:00");
        assert_eq!(json[3]["value"], Value::Null);
    }

    #[test]
    fn test_title_lookup() {
        let record = sample();
        assert_eq!(record.title(), Some("camp_1_a@b_com_20250115103000"));
        assert!(record.get("Missing").is_none());
        assert!(record.get("Email").unwrap().is_populated());
        assert!(!record.get("Company").unwrap().is_populated());
    }

    #[test]
    fn test_rich_text_truncated_on_char_boundary() {
        let long = "é".repeat(TEXT_CONTENT_LIMIT + 10);
        match PropertyValue::rich_text(long) {
            PropertyValue::RichText(s) => assert_eq!(s.chars().count(), TEXT_CONTENT_LIMIT),
            other => panic!("unexpected value: {:?}", other),
        }
    }
}
