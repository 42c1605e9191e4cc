//! Decoding of the compact ticket strings served by the listing endpoint.
//!
//! The backend encodes each ticket as
//! `"<KEY>: <SUMMARY> [<ASSIGNEE>] [<TYPE>] [<PRIORITY>]"`. Older backends
//! omit the trailing priority bracket, so two bracket groups are accepted
//! and the priority falls back to [`DEFAULT_PRIORITY`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display label for a ticket without an assignee.
pub const UNASSIGNED_LABEL: &str = "Non assigné";

/// Label the remote tracker writes into the encoding for unassigned tickets.
pub const REMOTE_UNASSIGNED: &str = "Unassigned";

/// Priority used when the encoding carries no priority bracket.
pub const DEFAULT_PRIORITY: &str = "Medium";

const KEY_SEPARATOR: &str = ": ";

static BRACKET_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("bracket group pattern is valid"));

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Reasons a ticket string could not be decoded.
///
/// Never shown to the operator: callers either skip the entry or fall back
/// to [`parse_or_degraded`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing \": \" separator after the ticket key")]
    MissingSeparator,

    #[error("expected at least 2 bracket groups, found {found}")]
    TooFewBrackets { found: usize },

    #[error("ticket key is empty")]
    EmptyKey,
}

pub type Result<T> = std::result::Result<T, DecodeError>;

// ---------------------------------------------------------------------------
// TicketRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    pub key: String,
    pub summary: String,
    pub assignee: String,
    pub issue_type: String,
    pub priority: String,
}

impl TicketRecord {
    pub fn is_assigned(&self) -> bool {
        self.assignee != UNASSIGNED_LABEL
    }
}

/// Map the remote "Unassigned" marker to the display sentinel.
pub fn normalize_assignee(raw: &str) -> String {
    if raw == REMOTE_UNASSIGNED {
        UNASSIGNED_LABEL.to_string()
    } else {
        raw.to_string()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Decode one ticket string.
///
/// Group 0 is the assignee, group 1 the issue type and group 2 (optional)
/// the priority. The summary is everything before the first `[`.
pub fn parse(raw: &str) -> Result<TicketRecord> {
    let (key, rest) = raw
        .split_once(KEY_SEPARATOR)
        .ok_or(DecodeError::MissingSeparator)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(DecodeError::EmptyKey);
    }

    let groups = bracket_groups(rest);
    if groups.len() < 2 {
        return Err(DecodeError::TooFewBrackets {
            found: groups.len(),
        });
    }

    let priority = groups
        .get(2)
        .map(|p| p.to_string())
        .unwrap_or_else(|| DEFAULT_PRIORITY.to_string());

    Ok(TicketRecord {
        key: key.to_string(),
        summary: summary_of(rest),
        assignee: normalize_assignee(groups[0]),
        issue_type: groups[1].to_string(),
        priority,
    })
}

/// Decode a ticket string, never failing.
///
/// When [`parse`] rejects the input, a degraded record is built from the
/// key and a best-effort summary and assignee. The issue type is left empty.
pub fn parse_or_degraded(raw: &str) -> TicketRecord {
    match parse(raw) {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(error = %err, raw, "ticket string decoded in degraded mode");
            degraded(raw)
        }
    }
}

fn degraded(raw: &str) -> TicketRecord {
    let trimmed = raw.trim();
    let (key, rest) = match trimmed.split_once(KEY_SEPARATOR) {
        Some((key, rest)) if !key.trim().is_empty() => (key.trim(), rest),
        _ => match trimmed.split_once(char::is_whitespace) {
            Some((key, rest)) => (key, rest),
            None => (trimmed, ""),
        },
    };

    let assignee = bracket_groups(rest)
        .first()
        .map(|a| normalize_assignee(a))
        .unwrap_or_else(|| UNASSIGNED_LABEL.to_string());

    TicketRecord {
        key: key.to_string(),
        summary: summary_of(rest),
        assignee,
        issue_type: String::new(),
        priority: DEFAULT_PRIORITY.to_string(),
    }
}

fn summary_of(rest: &str) -> String {
    match rest.find('[') {
        Some(idx) => rest[..idx].trim().to_string(),
        None => rest.trim().to_string(),
    }
}

/// Non-empty `[...]` groups in order of appearance.
///
/// A group runs from a `[` to the next `]`; an empty `[]` is not a group.
pub fn bracket_groups(text: &str) -> Vec<&str> {
    BRACKET_GROUP
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_groups_in_order() {
        assert_eq!(
            bracket_groups("Fix login [Alice] [Bug] [High]"),
            vec!["Alice", "Bug", "High"]
        );
    }

    #[test]
    fn bracket_groups_skip_empty_pairs() {
        assert_eq!(bracket_groups("a [] [x] []"), vec!["x"]);
    }

    #[test]
    fn bracket_groups_unterminated() {
        assert_eq!(bracket_groups("a [x] [y"), vec!["x"]);
    }

    #[test]
    fn bracket_groups_skip_stray_closing_bracket() {
        assert_eq!(bracket_groups("a] [b c] d]"), vec!["b c"]);
    }

    #[test]
    fn bracket_group_may_contain_open_bracket() {
        assert_eq!(bracket_groups("[a[b] c"), vec!["a[b"]);
    }

    #[test]
    fn summary_stops_at_first_bracket() {
        assert_eq!(summary_of("  Crash on save   [Bob] [Bug]"), "Crash on save");
        assert_eq!(summary_of("no brackets at all "), "no brackets at all");
    }

    #[test]
    fn key_is_trimmed() {
        let record = parse(" PROJ-9 : x [A] [Task]").unwrap();
        assert_eq!(record.key, "PROJ-9");
    }

    #[test]
    fn degraded_without_separator_uses_first_word() {
        let record = degraded("PROJ-3 something odd");
        assert_eq!(record.key, "PROJ-3");
        assert_eq!(record.summary, "something odd");
        assert_eq!(record.assignee, UNASSIGNED_LABEL);
    }

    #[test]
    fn blank_key_is_rejected() {
        assert_eq!(parse(" : x [A] [Task]"), Err(DecodeError::EmptyKey));
        assert_eq!(degraded(": x [A] [Task]").key, ":");
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = parse("K-1: S [A] [Bug] [Low]").unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["issueType"], "Bug");
        assert_eq!(json["priority"], "Low");
    }
}
