//! Normalisation of the `/tickets/{key}/details` payload.
//!
//! The backend passes several tracker fields through untouched, so the
//! description may be a rich document and the people and priority fields
//! may be plain strings or objects.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::forms::TicketFields;
use crate::ticket::UNASSIGNED_LABEL;

pub const UNTITLED: &str = "Sans titre";
pub const UNDEFINED_PRIORITY: &str = "Non définie";
pub const UNKNOWN: &str = "Inconnu";

/// Person fields tried in order when the assignee is an object.
const PERSON_FIELDS: [&str; 5] = ["displayName", "name", "key", "accountId", "emailAddress"];

const TRACKER_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// A creation or update date; kept verbatim when it cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Parsed(DateTime<FixedOffset>),
    Raw(String),
}

impl Timestamp {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let parsed = DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, TRACKER_TIMESTAMP));
        Some(match parsed {
            Ok(at) => Timestamp::Parsed(at),
            Err(_) => Timestamp::Raw(raw.to_string()),
        })
    }

    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Timestamp::Parsed(at) => Some(*at),
            Timestamp::Raw(_) => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Parsed(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M")),
            Timestamp::Raw(raw) => write!(f, "{}", raw),
        }
    }
}

// ---------------------------------------------------------------------------
// TicketDetails
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetails {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub status: String,
    pub assignee: String,
    pub priority: String,
    pub issue_type: String,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
    pub reporter: String,
    pub project: String,
}

impl TicketDetails {
    /// Decode the `ticket` object of the details response.
    ///
    /// `key` is used when the payload does not repeat it.
    pub fn from_value(key: &str, ticket: &Value) -> Self {
        let text = |field: &str| ticket.get(field).and_then(name_of);

        Self {
            key: text("key").unwrap_or_else(|| key.to_string()),
            summary: text("summary").unwrap_or_else(|| UNTITLED.to_string()),
            description: ticket
                .get("description")
                .map(flatten_description)
                .unwrap_or_default(),
            status: text("status").unwrap_or_default(),
            assignee: ticket
                .get("assignee")
                .and_then(person_of)
                .unwrap_or_else(|| UNASSIGNED_LABEL.to_string()),
            priority: text("priority").unwrap_or_else(|| UNDEFINED_PRIORITY.to_string()),
            issue_type: text("issueType").unwrap_or_default(),
            created: text("created").and_then(|raw| Timestamp::parse(&raw)),
            updated: text("updated").and_then(|raw| Timestamp::parse(&raw)),
            reporter: ticket
                .get("reporter")
                .and_then(person_of)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            project: text("project").unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }

    /// Values the edit form opens with.
    pub fn fields(&self) -> TicketFields {
        TicketFields {
            summary: self.summary.clone(),
            description: self.description.clone(),
            priority: self.priority.clone(),
            issue_type: self.issue_type.clone(),
            assignee: self.assignee.clone(),
        }
    }
}

/// A string, or the `name` of an object.
fn name_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => map.get("name").and_then(name_of),
        _ => None,
    }
}

fn person_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => PERSON_FIELDS.iter().find_map(|field| match map.get(*field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }),
        _ => None,
    }
}

/// Plain text of a description.
///
/// A rich document contributes the text nodes of each block, one per line.
pub fn flatten_description(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Object(_) => {
            let mut out = String::new();
            let blocks = value.get("content").and_then(Value::as_array);
            for block in blocks.into_iter().flatten() {
                let nodes = block.get("content").and_then(Value::as_array);
                for node in nodes.into_iter().flatten() {
                    if node.get("type").and_then(Value::as_str) != Some("text") {
                        continue;
                    }
                    if let Some(text) = node.get("text").and_then(Value::as_str) {
                        if !text.is_empty() {
                            out.push_str(text);
                            out.push('\n');
                        }
                    }
                }
            }
            out.trim().to_string()
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn person_prefers_display_name() {
        let v = json!({"accountId": "abc", "displayName": "Alice"});
        assert_eq!(person_of(&v).as_deref(), Some("Alice"));
        let v = json!({"accountId": "abc", "displayName": ""});
        assert_eq!(person_of(&v).as_deref(), Some("abc"));
    }

    #[test]
    fn name_of_object() {
        assert_eq!(name_of(&json!({"name": "High"})).as_deref(), Some("High"));
        assert_eq!(name_of(&json!(null)), None);
    }

    #[test]
    fn timestamp_tracker_format() {
        let ts = Timestamp::parse("2024-03-01T10:15:30.000+0100").unwrap();
        assert!(ts.as_datetime().is_some());
        assert_eq!(Timestamp::parse("  "), None);
        assert_eq!(
            Timestamp::parse("yesterday"),
            Some(Timestamp::Raw("yesterday".into()))
        );
    }
}
