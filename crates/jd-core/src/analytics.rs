//! Derived analytics: totals, weekly trend classification, priority and
//! type highlights, and the insights shown next to the charts.
//!
//! Everything here is a pure function of an [`AnalyticsSnapshot`]; the
//! metrics are recomputed on every refresh and never stored.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ordered::OrderedMap;

/// Label → ticket count, in the order the backend listed the labels.
pub type Distribution = OrderedMap<u64>;

/// Priority labels counted as high priority.
pub const HIGH_PRIORITY_LABELS: [&str; 3] = ["High", "Highest", "Critical"];

/// Reported when the type distribution is empty.
pub const NO_TYPE: &str = "N/A";

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyBucket {
    pub week: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    #[serde(default)]
    pub weekly_buckets: Vec<WeeklyBucket>,
    #[serde(default)]
    pub priority_distribution: Distribution,
    #[serde(default)]
    pub type_distribution: Distribution,
    #[serde(default)]
    pub assignment_distribution: Distribution,
    /// `null` or absent when the backend has nothing to average.
    #[serde(default)]
    pub avg_resolution_days: Option<f64>,
    #[serde(default)]
    pub total_tickets: u64,
    #[serde(default)]
    pub weekly_average: Option<f64>,
}

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        };
        write!(f, "{}", label)
    }
}

/// Average resolution time, qualified so that an empty period is never
/// mistaken for instant resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum Resolution {
    NoResolvedTickets,
    Days(f64),
}

impl Resolution {
    pub fn from_average(days: f64) -> Self {
        if days > 0.0 {
            Resolution::Days(days)
        } else {
            Resolution::NoResolvedTickets
        }
    }

    pub fn days(&self) -> Option<f64> {
        match self {
            Resolution::Days(d) => Some(*d),
            Resolution::NoResolvedTickets => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Days(d) => write!(f, "{d:.1} days"),
            Resolution::NoResolvedTickets => write!(f, "no resolved tickets in period"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub total_tickets: u64,
    pub weekly_average: f64,
    pub trend: Trend,
    /// Magnitude of the change between the two halves of the trend window.
    pub trend_percent: f64,
    pub high_priority_count: u64,
    pub most_common_type: String,
    pub resolution: Resolution,
}

/// Trend window and classification threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSettings {
    pub window: usize,
    pub threshold_percent: f64,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            window: 4,
            threshold_percent: 10.0,
        }
    }
}

fn mean(counts: &[u64]) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    counts.iter().sum::<u64>() as f64 / counts.len() as f64
}

/// Classify the recent trend of weekly counts.
///
/// Returns the trend and the absolute percentage change between the mean of
/// the earlier half and the mean of the later half of the last
/// `settings.window` weeks.
pub fn classify_trend(buckets: &[WeeklyBucket], settings: &TrendSettings) -> (Trend, f64) {
    let start = buckets.len().saturating_sub(settings.window);
    let recent: Vec<u64> = buckets[start..].iter().map(|b| b.count).collect();
    let (first, second) = recent.split_at(recent.len() / 2);

    let first_mean = mean(first);
    if first_mean == 0.0 {
        return (Trend::Stable, 0.0);
    }

    let percent = (mean(second) - first_mean) / first_mean * 100.0;
    let trend = if percent > settings.threshold_percent {
        Trend::Up
    } else if percent < -settings.threshold_percent {
        Trend::Down
    } else {
        Trend::Stable
    };
    (trend, percent.abs())
}

/// Key with the highest count; the earliest listed key wins ties.
pub fn most_common(distribution: &Distribution) -> Option<&str> {
    let mut best: Option<(&str, u64)> = None;
    for (label, &count) in distribution.iter() {
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((label, count)),
        }
    }
    best.map(|(label, _)| label)
}

pub fn high_priority_count(priorities: &Distribution) -> u64 {
    HIGH_PRIORITY_LABELS
        .iter()
        .map(|label| priorities.get(label).copied().unwrap_or(0))
        .sum()
}

pub fn compute_metrics(snapshot: &AnalyticsSnapshot) -> DerivedMetrics {
    compute_metrics_with(snapshot, &TrendSettings::default())
}

pub fn compute_metrics_with(snapshot: &AnalyticsSnapshot, settings: &TrendSettings) -> DerivedMetrics {
    let total_tickets = if snapshot.total_tickets > 0 {
        snapshot.total_tickets
    } else {
        snapshot.weekly_buckets.iter().map(|b| b.count).sum()
    };

    let weekly_average = match snapshot.weekly_average {
        Some(avg) if avg > 0.0 => avg,
        _ => total_tickets as f64 / snapshot.weekly_buckets.len().max(1) as f64,
    };

    let (trend, trend_percent) = classify_trend(&snapshot.weekly_buckets, settings);

    DerivedMetrics {
        total_tickets,
        weekly_average,
        trend,
        trend_percent,
        high_priority_count: high_priority_count(&snapshot.priority_distribution),
        most_common_type: most_common(&snapshot.type_distribution)
            .unwrap_or(NO_TYPE)
            .to_string(),
        resolution: Resolution::from_average(snapshot.avg_resolution_days.unwrap_or(0.0)),
    }
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightLevel {
    Info,
    Positive,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub level: InsightLevel,
    pub message: String,
}

impl Insight {
    fn new(level: InsightLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Share of high-priority tickets above which an insight warns.
pub const HIGH_PRIORITY_WARN_SHARE: f64 = 0.30;
pub const FAST_RESOLUTION_DAYS: f64 = 3.0;
pub const SLOW_RESOLUTION_DAYS: f64 = 14.0;

/// Human-readable observations supporting the trend classification.
pub fn insights(metrics: &DerivedMetrics) -> Vec<Insight> {
    let mut out = Vec::new();

    out.push(match metrics.trend {
        Trend::Up => Insight::new(
            InsightLevel::Warning,
            format!("Ticket volume up {:.0}% over recent weeks", metrics.trend_percent),
        ),
        Trend::Down => Insight::new(
            InsightLevel::Positive,
            format!("Ticket volume down {:.0}% over recent weeks", metrics.trend_percent),
        ),
        Trend::Stable => Insight::new(InsightLevel::Info, "Ticket volume is stable"),
    });

    if metrics.total_tickets > 0 {
        let share = metrics.high_priority_count as f64 / metrics.total_tickets as f64;
        if share > HIGH_PRIORITY_WARN_SHARE {
            out.push(Insight::new(
                InsightLevel::Warning,
                format!(
                    "{} high priority tickets ({:.0}% of total)",
                    metrics.high_priority_count,
                    share * 100.0
                ),
            ));
        }
    }

    if metrics.most_common_type != NO_TYPE {
        out.push(Insight::new(
            InsightLevel::Info,
            format!("Most common type: {}", metrics.most_common_type),
        ));
    }

    out.push(match metrics.resolution {
        Resolution::NoResolvedTickets => {
            Insight::new(InsightLevel::Warning, "No resolved tickets in period")
        }
        Resolution::Days(d) if d <= FAST_RESOLUTION_DAYS => Insight::new(
            InsightLevel::Positive,
            format!("Tickets resolved in {d:.1} days on average"),
        ),
        Resolution::Days(d) if d > SLOW_RESOLUTION_DAYS => Insight::new(
            InsightLevel::Warning,
            format!("Slow resolution: {d:.1} days on average"),
        ),
        Resolution::Days(d) => Insight::new(
            InsightLevel::Info,
            format!("Average resolution time: {d:.1} days"),
        ),
    });

    out
}
