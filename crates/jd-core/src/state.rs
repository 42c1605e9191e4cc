//! Presentation state container.
//!
//! The board and analytics slices refresh independently. Each slice is
//! replaced wholesale when a fetch succeeds; a failed fetch keeps the last
//! good data and records a dismissible error. Overlapping refreshes are not
//! sequenced: whichever response is applied last wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analytics::{compute_metrics_with, AnalyticsSnapshot, DerivedMetrics, TrendSettings};
use crate::facets::{derive_facets, BoardFilter, FilterFacets, TicketBoard};
use crate::history::TimeWindow;

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Connectivity {
    #[default]
    Unknown,
    Connected,
    Degraded(String),
}

impl Connectivity {
    /// Interpret a `GET /health` payload.
    pub fn from_health(payload: &Value) -> Self {
        match payload.get("jira_connection").and_then(Value::as_str) {
            Some("connected") => Connectivity::Connected,
            Some(other) => Connectivity::Degraded(format!("tracker {other}")),
            None => {
                let reason = payload
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("health check returned no connection status");
                Connectivity::Degraded(reason.to_string())
            }
        }
    }

    /// Creation is disabled while degraded; browsing stays available.
    pub fn can_create_tickets(&self) -> bool {
        !matches!(self, Connectivity::Degraded(_))
    }

    /// Persistent banner text, if any.
    pub fn banner(&self) -> Option<String> {
        match self {
            Connectivity::Degraded(reason) => {
                Some(format!("Ticket service unavailable ({reason}); creation disabled"))
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// In-flight tracking
// ---------------------------------------------------------------------------

/// Outstanding requests of one slice and the most recent one issued.
#[derive(Debug, Clone)]
struct InFlight<R> {
    count: usize,
    latest: Option<R>,
}

impl<R> Default for InFlight<R> {
    fn default() -> Self {
        Self {
            count: 0,
            latest: None,
        }
    }
}

impl<R: Clone + PartialEq> InFlight<R> {
    fn begin(&mut self, request: &R) -> bool {
        if self.latest.as_ref() == Some(request) {
            return false;
        }
        self.count += 1;
        self.latest = Some(request.clone());
        true
    }

    fn finish(&mut self) {
        self.count = self.count.saturating_sub(1);
        if self.count == 0 {
            self.latest = None;
        }
    }

    fn is_pending(&self) -> bool {
        self.count > 0
    }
}

// ---------------------------------------------------------------------------
// Board slice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct BoardSlice {
    board: TicketBoard,
    facets: FilterFacets,
    in_flight: InFlight<BoardFilter>,
    error: Option<String>,
}

impl BoardSlice {
    pub fn board(&self) -> &TicketBoard {
        &self.board
    }

    pub fn facets(&self) -> &FilterFacets {
        &self.facets
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_pending()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Mark a refresh for `filter` in flight. Returns `false` when the same
    /// filter is already pending; a different filter races the pending one.
    pub fn begin_refresh(&mut self, filter: &BoardFilter) -> bool {
        self.in_flight.begin(filter)
    }

    pub fn apply<E: ToString>(&mut self, result: Result<TicketBoard, E>) {
        self.in_flight.finish();
        match result {
            Ok(board) => {
                self.facets = derive_facets(&board);
                self.board = board;
                self.error = None;
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(error = %message, "board refresh failed, keeping last board");
                self.error = Some(message);
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

// ---------------------------------------------------------------------------
// Analytics slice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AnalyticsSlice {
    snapshot: Option<AnalyticsSnapshot>,
    metrics: Option<DerivedMetrics>,
    window: TimeWindow,
    settings: TrendSettings,
    in_flight: InFlight<TimeWindow>,
    error: Option<String>,
}

impl AnalyticsSlice {
    pub fn with_settings(settings: TrendSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Option<&AnalyticsSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn metrics(&self) -> Option<&DerivedMetrics> {
        self.metrics.as_ref()
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_pending()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Mark a refresh for `window` in flight. Returns `false` when the same
    /// window is already pending.
    pub fn begin_refresh(&mut self, window: TimeWindow) -> bool {
        if !self.in_flight.begin(&window) {
            return false;
        }
        self.window = window;
        true
    }

    pub fn apply<E: ToString>(&mut self, result: Result<AnalyticsSnapshot, E>) {
        self.in_flight.finish();
        match result {
            Ok(snapshot) => {
                self.metrics = Some(compute_metrics_with(&snapshot, &self.settings));
                self.snapshot = Some(snapshot);
                self.error = None;
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(error = %message, "analytics refresh failed, keeping last snapshot");
                self.error = Some(message);
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub board: BoardSlice,
    pub analytics: AnalyticsSlice,
    pub connectivity: Connectivity,
    selection: Option<String>,
}

impl AppState {
    pub fn new(settings: TrendSettings) -> Self {
        Self {
            analytics: AnalyticsSlice::with_settings(settings),
            ..Self::default()
        }
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn select(&mut self, key: impl Into<String>) {
        self.selection = Some(key.into());
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn set_connectivity(&mut self, connectivity: Connectivity) {
        if connectivity != self.connectivity {
            tracing::info!(?connectivity, "connectivity changed");
        }
        self.connectivity = connectivity;
    }
}
