//! Aggregation of a raw ticket history into an [`AnalyticsSnapshot`].
//!
//! This is what the backend does behind `GET /analytics`; it is kept here
//! so that snapshots can also be built from exported histories.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsSnapshot, Distribution, WeeklyBucket};
use crate::ticket::{normalize_assignee, UNASSIGNED_LABEL};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketHistoryEntry {
    pub key: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub resolved: Option<DateTime<Utc>>,
    pub priority: String,
    pub issue_type: String,
    #[serde(default)]
    pub assignee: Option<String>,
}

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// Period selector of `GET /analytics/filtered?time=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    #[default]
    All,
    Week,
    Month,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time window \"{0}\" (expected all, week or month)")]
pub struct UnknownTimeWindow(pub String);

impl FromStr for TimeWindow {
    type Err = UnknownTimeWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(TimeWindow::All),
            "week" => Ok(TimeWindow::Week),
            "month" => Ok(TimeWindow::Month),
            other => Err(UnknownTimeWindow(other.to_string())),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeWindow::All => "all",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
        };
        write!(f, "{}", label)
    }
}

impl TimeWindow {
    /// Earliest creation date included, `None` for the whole history.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeWindow::All => None,
            TimeWindow::Week => Some(now - Duration::days(7)),
            TimeWindow::Month => Some(now - Duration::days(30)),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// ISO week label, e.g. `2024-W07`.
pub fn week_label(at: DateTime<Utc>) -> String {
    let iw = at.iso_week();
    format!("{:04}-W{:02}", iw.year(), iw.week())
}

fn bump(distribution: &mut Distribution, label: &str) {
    match distribution.get_mut(label) {
        Some(count) => *count += 1,
        None => distribution.insert(label, 1),
    }
}

/// Build a snapshot from the entries created inside `window`.
///
/// Weekly buckets exist only for weeks that saw at least one ticket.
/// Distribution labels keep the order in which they first occur.
pub fn aggregate(
    history: &[TicketHistoryEntry],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> AnalyticsSnapshot {
    let cutoff = window.cutoff(now);
    let entries: Vec<&TicketHistoryEntry> = history
        .iter()
        .filter(|e| cutoff.map_or(true, |c| e.created >= c))
        .collect();

    let mut weeks: BTreeMap<(i32, u32), u64> = BTreeMap::new();
    let mut snapshot = AnalyticsSnapshot::default();
    let mut resolution_days = Vec::new();

    for entry in &entries {
        let iw = entry.created.iso_week();
        *weeks.entry((iw.year(), iw.week())).or_insert(0) += 1;

        bump(&mut snapshot.priority_distribution, &entry.priority);
        bump(&mut snapshot.type_distribution, &entry.issue_type);

        let assignee = match entry.assignee.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => normalize_assignee(name),
            _ => UNASSIGNED_LABEL.to_string(),
        };
        bump(&mut snapshot.assignment_distribution, &assignee);

        if let Some(resolved) = entry.resolved {
            if resolved >= entry.created {
                resolution_days.push((resolved - entry.created).num_seconds() as f64 / 86_400.0);
            }
        }
    }

    snapshot.weekly_buckets = weeks
        .into_iter()
        .map(|((year, week), count)| WeeklyBucket {
            week: format!("{year:04}-W{week:02}"),
            count,
        })
        .collect();

    snapshot.total_tickets = entries.len() as u64;
    snapshot.weekly_average =
        Some(snapshot.total_tickets as f64 / snapshot.weekly_buckets.len().max(1) as f64);
    snapshot.avg_resolution_days = Some(if resolution_days.is_empty() {
        0.0
    } else {
        resolution_days.iter().sum::<f64>() / resolution_days.len() as f64
    });

    tracing::debug!(
        window = %window,
        tickets = snapshot.total_tickets,
        weeks = snapshot.weekly_buckets.len(),
        "history aggregated"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_time_window() {
        assert_eq!("Week".parse::<TimeWindow>().unwrap(), TimeWindow::Week);
        assert_eq!("".parse::<TimeWindow>().unwrap(), TimeWindow::All);
        assert!("year".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn week_label_uses_iso_year() {
        // 2021-01-01 belongs to ISO week 53 of 2020.
        let at = Utc.with_ymd_and_hms(2021, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(week_label(at), "2020-W53");
    }
}
