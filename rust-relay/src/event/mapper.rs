//! Smartlead event to Notion record mapping.
//!
//! The mapper reads the upstream payload as loosely-typed JSON so that
//! missing or unexpected fields degrade to defaults instead of failing.
//! Only values that cannot be coerced to their property type at all are
//! rejected, with a `MappingError` naming the property.

use chrono::{DateTime, Offset, Utc};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::MappingError;
use crate::event::timestamp::coerce_timestamp;
use crate::event::types::EventType;
use crate::notion::{NotionRecord, PropertyValue};

pub const EVENT_ID: &str = "Event ID";
pub const EVENT_TYPE: &str = "Event Type";
pub const TIMESTAMP: &str = "Timestamp";
pub const REPLY_TIMESTAMP: &str = "Reply Timestamp";
pub const CAMPAIGN: &str = "Campaign";
pub const EMAIL: &str = "Email";
pub const FIRST_NAME: &str = "First Name";
pub const LAST_NAME: &str = "Last Name";
pub const COMPANY: &str = "Company";
pub const CITY: &str = "City";
pub const ADDRESS: &str = "Address";
pub const FROM: &str = "From";
pub const SUBJECT: &str = "Subject";
pub const LINK: &str = "Link";

/// Every property a mapped record carries, in insertion order.
pub const PROPERTY_NAMES: [&str; 14] = [
    EVENT_ID,
    EVENT_TYPE,
    TIMESTAMP,
    REPLY_TIMESTAMP,
    CAMPAIGN,
    EMAIL,
    FIRST_NAME,
    LAST_NAME,
    COMPANY,
    CITY,
    ADDRESS,
    FROM,
    SUBJECT,
    LINK,
];

/// Notion rejects select option names longer than this.
const SELECT_NAME_LIMIT: usize = 100;

/// Map a parsed Smartlead event into a Notion record.
///
/// `received_at` stands in for the event timestamp when the payload has none.
pub fn map_event(event: &Value, received_at: DateTime<Utc>) -> Result<NotionRecord, MappingError> {
    let event_name = text(EVENT_TYPE, lookup(event, &[&["event"], &["event_type"]]))?;
    let campaign = text(CAMPAIGN, lookup(event, &[&["campaign"], &["campaign_id"]]))?;
    let email = text(
        EMAIL,
        lookup(event, &[&["recipient", "email"], &["lead_email"]]),
    )?;

    let timestamp_value = lookup(event, &[&["timestamp"], &["event_timestamp"]]);
    let timestamp = coerce_timestamp(timestamp_value)
        .map_err(|reason| MappingError::new(TIMESTAMP, reason))?
        .unwrap_or_else(|| received_at.with_timezone(&Utc.fix()));
    let raw_timestamp = text(TIMESTAMP, timestamp_value)?;

    let reply_timestamp = coerce_timestamp(lookup(
        event,
        &[&["reply_timestamp"], &["replied_at"]],
    ))
    .map_err(|reason| MappingError::new(REPLY_TIMESTAMP, reason))?;

    let address = join_address(
        text(ADDRESS, lookup(event, &[&["recipient", "address1"]]))?,
        text(ADDRESS, lookup(event, &[&["recipient", "neighborhood"]]))?,
    );

    let mut record = NotionRecord::new();
    record.push(
        EVENT_ID,
        PropertyValue::title(event_id(&campaign, &email, &raw_timestamp)),
    );
    record.push(EVENT_TYPE, PropertyValue::Select(select_option(&event_name)));
    record.push(TIMESTAMP, PropertyValue::Date(Some(timestamp)));
    record.push(REPLY_TIMESTAMP, PropertyValue::Date(reply_timestamp));
    record.push(CAMPAIGN, PropertyValue::rich_text(campaign));
    record.push(EMAIL, PropertyValue::Email(email_value(email)?));
    record.push(
        FIRST_NAME,
        PropertyValue::rich_text(text(FIRST_NAME, lookup(event, &[&["recipient", "first_name"]]))?),
    );
    record.push(
        LAST_NAME,
        PropertyValue::rich_text(text(LAST_NAME, lookup(event, &[&["recipient", "last_name"]]))?),
    );
    record.push(
        COMPANY,
        PropertyValue::rich_text(text(COMPANY, lookup(event, &[&["recipient", "company"]]))?),
    );
    record.push(
        CITY,
        PropertyValue::rich_text(text(CITY, lookup(event, &[&["recipient", "city"]]))?),
    );
    record.push(ADDRESS, PropertyValue::rich_text(address));
    record.push(
        FROM,
        PropertyValue::rich_text(text(FROM, lookup(event, &[&["message", "from"]]))?),
    );
    record.push(
        SUBJECT,
        PropertyValue::rich_text(text(SUBJECT, lookup(event, &[&["message", "subject"]]))?),
    );
    record.push(
        LINK,
        PropertyValue::Url(url_value(text(LINK, lookup(event, &[&["message", "link"]]))?)?),
    );

    Ok(record)
}

/// Build the record title from campaign, recipient and timestamp.
///
/// The timestamp is reduced to its first 19 characters with separators
/// removed, so `2025-01-15T10:30:00Z` contributes `20250115103000`.
pub fn event_id(campaign: &str, email: &str, raw_timestamp: &str) -> String {
    let campaign = if campaign.is_empty() { "unknown" } else { campaign };
    let email = if email.is_empty() { "unknown" } else { email };

    let compact: String = raw_timestamp
        .chars()
        .take(19)
        .filter(|c| !matches!(c, '-' | ':' | 'T'))
        .collect();

    format!("{}_{}_{}", campaign, email, compact).replace(|c: char| c == ' ' || c == '.', "_")
}

/// First non-null value found along any of the key paths.
fn lookup<'a>(root: &'a Value, paths: &[&[&str]]) -> Option<&'a Value> {
    paths.iter().find_map(|path| {
        path.iter()
            .try_fold(root, |node, key| node.get(key))
            .filter(|v| !v.is_null())
    })
}

/// Coerce a scalar into text. Absent values become empty.
fn text(field: &'static str, value: Option<&Value>) -> Result<String, MappingError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Array(_)) => Err(MappingError::new(field, "expected text, found an array")),
        Some(Value::Object(_)) => Err(MappingError::new(field, "expected text, found an object")),
    }
}

fn select_option(event_name: &str) -> Option<String> {
    if event_name.trim().is_empty() {
        return None;
    }

    match EventType::from_wire(event_name) {
        Some(t) => Some(t.select_option().to_string()),
        None => {
            debug!(event = %event_name, "event_type_unrecognised");
            Some(select_name(event_name))
        }
    }
}

/// Commas are not allowed in option names.
fn select_name(raw: &str) -> String {
    raw.trim()
        .replace(',', " ")
        .chars()
        .take(SELECT_NAME_LIMIT)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn email_value(email: String) -> Result<Option<String>, MappingError> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(None);
    }
    if !email.contains('@') {
        return Err(MappingError::new(EMAIL, "is not an email address"));
    }
    Ok(Some(email.to_string()))
}

fn url_value(link: String) -> Result<Option<String>, MappingError> {
    let link = link.trim();
    if link.is_empty() {
        return Ok(None);
    }

    match Url::parse(link) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(Some(link.to_string())),
        Ok(url) => Err(MappingError::new(
            LINK,
            format!("has unsupported scheme {:?}", url.scheme()),
        )),
        Err(e) => Err(MappingError::new(LINK, format!("is not a URL: {}", e))),
    }
}

fn join_address(street: String, neighborhood: String) -> String {
    match (street.trim().is_empty(), neighborhood.trim().is_empty()) {
        (false, false) => format!("{}, {}", street, neighborhood),
        (true, false) => neighborhood,
        _ => street,
    }
}
