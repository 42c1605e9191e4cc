//! Filter facets derived from a live ticket board.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::forms::is_unassigned_label;
use crate::ticket::{self, TicketRecord, UNASSIGNED_LABEL};

/// Status name → encoded ticket strings, as served by `GET /tickets`.
pub type TicketBoard = BTreeMap<String, Vec<String>>;

/// Priorities that are always selectable, lowest first.
pub const CANONICAL_PRIORITIES: [&str; 4] = ["Low", "Medium", "High", "Highest"];

/// Issue types offered when the board does not reveal any.
pub const DEFAULT_TYPES: [&str; 4] = ["Task", "Bug", "Story", "Epic"];

/// Rank given to status labels outside the known workflow stages.
pub const UNKNOWN_STATUS_RANK: u32 = 999;

const TODO_LABELS: &[&str] = &[
    "à faire", "a faire", "todo", "to do", "open", "backlog", "nouveau", "new",
];
const IN_PROGRESS_LABELS: &[&str] = &["en cours", "in progress", "in review", "en revue"];
const DONE_LABELS: &[&str] = &[
    "terminé",
    "terminée",
    "terminés",
    "terminées",
    "termine",
    "done",
    "closed",
    "clos",
    "resolved",
    "résolu",
];

// ---------------------------------------------------------------------------
// FilterFacets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterFacets {
    pub assignees: BTreeSet<String>,
    pub types: BTreeSet<String>,
    pub priorities: BTreeSet<String>,
    pub statuses: Vec<String>,
}

impl FilterFacets {
    /// Issue types to offer, falling back to `defaults` when none were seen.
    pub fn types_or_default<S: AsRef<str>>(&self, defaults: &[S]) -> BTreeSet<String> {
        if self.types.is_empty() {
            defaults.iter().map(|t| t.as_ref().to_string()).collect()
        } else {
            self.types.clone()
        }
    }

    /// Priorities with the canonical ones first in severity order, then any
    /// extra labels the tracker uses in lexical order.
    pub fn priorities_by_severity(&self) -> Vec<String> {
        let mut ordered: Vec<String> = CANONICAL_PRIORITIES.iter().map(|p| p.to_string()).collect();
        ordered.extend(
            self.priorities
                .iter()
                .filter(|p| !CANONICAL_PRIORITIES.contains(&p.as_str()))
                .cloned(),
        );
        ordered
    }
}

/// Rank of a workflow status label: 1 to-do, 2 in progress, 3 done.
pub fn status_rank(label: &str) -> u32 {
    let normalized = label.trim().to_lowercase();
    if TODO_LABELS.contains(&normalized.as_str()) {
        1
    } else if IN_PROGRESS_LABELS.contains(&normalized.as_str()) {
        2
    } else if DONE_LABELS.contains(&normalized.as_str()) {
        3
    } else {
        UNKNOWN_STATUS_RANK
    }
}

/// Sort status labels by workflow rank, then lexically.
pub fn order_statuses<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut statuses: Vec<String> = labels.into_iter().cloned().collect();
    statuses.sort_by(|a, b| status_rank(a).cmp(&status_rank(b)).then_with(|| a.cmp(b)));
    statuses
}

/// Derive the filter facets of a board snapshot.
///
/// Entries that fail to decode are skipped.
pub fn derive_facets(board: &TicketBoard) -> FilterFacets {
    let mut facets = FilterFacets {
        priorities: CANONICAL_PRIORITIES.iter().map(|p| p.to_string()).collect(),
        statuses: order_statuses(board.keys()),
        ..FilterFacets::default()
    };

    for record in board.values().flatten().filter_map(|raw| ticket::parse(raw).ok()) {
        if record.is_assigned() {
            facets.assignees.insert(record.assignee);
        }
        facets.types.insert(record.issue_type);
        facets.priorities.insert(record.priority);
    }

    facets
}

// ---------------------------------------------------------------------------
// Local filtering
// ---------------------------------------------------------------------------

/// Listing filter, mirroring the query parameters of `GET /tickets`.
///
/// Empty values and `"all"` disable a criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default, rename = "type")]
    pub issue_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
}

fn active(criterion: &str) -> Option<String> {
    let c = criterion.trim();
    if c.is_empty() || c.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(c.to_lowercase())
    }
}

impl BoardFilter {
    pub fn is_empty(&self) -> bool {
        [&self.search, &self.assignee, &self.issue_type, &self.status, &self.priority]
            .iter()
            .all(|c| active(c).is_none())
    }

    fn accepts_status(&self, status: &str) -> bool {
        active(&self.status).map_or(true, |s| s == status.to_lowercase())
    }

    fn accepts(&self, raw: &str, record: &TicketRecord) -> bool {
        if let Some(search) = active(&self.search) {
            if !raw.to_lowercase().contains(&search) {
                return false;
            }
        }
        if let Some(assignee) = active(&self.assignee) {
            let matches = if record.is_assigned() {
                !is_unassigned_label(&assignee) && record.assignee.to_lowercase().contains(&assignee)
            } else {
                is_unassigned_label(&assignee)
            };
            if !matches {
                return false;
            }
        }
        if let Some(issue_type) = active(&self.issue_type) {
            if record.issue_type.to_lowercase() != issue_type {
                return false;
            }
        }
        if let Some(priority) = active(&self.priority) {
            if record.priority.to_lowercase() != priority {
                return false;
            }
        }
        true
    }
}

/// Apply `filter` to an already-loaded board.
///
/// Undecodable entries are dropped, as are statuses left without tickets.
pub fn filter_board(board: &TicketBoard, filter: &BoardFilter) -> TicketBoard {
    board
        .iter()
        .filter(|(status, _)| filter.accepts_status(status))
        .filter_map(|(status, tickets)| {
            let kept: Vec<String> = tickets
                .iter()
                .filter(|raw| match ticket::parse(raw) {
                    Ok(record) => filter.accepts(raw, &record),
                    Err(_) => false,
                })
                .cloned()
                .collect();
            (!kept.is_empty()).then(|| (status.clone(), kept))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Board statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStats {
    pub total_tickets: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_assignee: BTreeMap<String, usize>,
    pub unassigned_count: usize,
}

pub fn board_stats(board: &TicketBoard) -> BoardStats {
    let mut stats = BoardStats::default();

    for (status, tickets) in board {
        stats.by_status.insert(status.clone(), tickets.len());
        stats.total_tickets += tickets.len();

        for raw in tickets {
            let record = ticket::parse_or_degraded(raw);
            if record.assignee == UNASSIGNED_LABEL {
                stats.unassigned_count += 1;
            } else {
                *stats.by_assignee.entry(record.assignee).or_insert(0) += 1;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_is_case_and_space_insensitive() {
        assert_eq!(status_rank("  IN PROGRESS "), 2);
        assert_eq!(status_rank("Terminées"), 3);
        assert_eq!(status_rank("Open"), 1);
        assert_eq!(status_rank("Blocked"), UNKNOWN_STATUS_RANK);
    }

    #[test]
    fn unknown_statuses_sort_lexically() {
        let labels = vec!["Zeta".to_string(), "Blocked".to_string(), "Todo".to_string()];
        assert_eq!(order_statuses(&labels), vec!["Todo", "Blocked", "Zeta"]);
    }

    #[test]
    fn priorities_by_severity_appends_extras() {
        let mut facets = FilterFacets::default();
        facets.priorities.insert("Blocker".into());
        facets.priorities.insert("High".into());
        assert_eq!(
            facets.priorities_by_severity(),
            vec!["Low", "Medium", "High", "Highest", "Blocker"]
        );
    }

    #[test]
    fn empty_filter_is_detected() {
        let filter = BoardFilter {
            status: "ALL".into(),
            ..BoardFilter::default()
        };
        assert!(filter.is_empty());
    }
}
