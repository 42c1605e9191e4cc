//! The backend seam and the async drivers built on it.
//!
//! Drivers suspend on one request at a time and write the outcome into the
//! workflow or state slice they were handed. Failures never escape as
//! errors here: they become a degraded workflow, a dismissible slice error,
//! or a degraded connectivity banner.

use async_trait::async_trait;
use serde_json::Value;

use jd_core::analytics::AnalyticsSnapshot;
use jd_core::facets::{BoardFilter, TicketBoard};
use jd_core::history::TimeWindow;
use jd_core::state::{AppState, Connectivity};
use jd_core::transition::{
    self, TransitionRequest, TransitionSet, TransitionWorkflow, WorkflowState,
};

use crate::client::Ack;
use crate::error::{ClientError, Result};

/// Backend operations the drivers depend on.
#[async_trait]
pub trait TicketBackend: Send + Sync {
    async fn list_tickets(&self, filter: &BoardFilter) -> Result<TicketBoard>;

    async fn transitions(&self, key: &str) -> Result<TransitionSet>;

    async fn transition(&self, key: &str, request: &TransitionRequest) -> Result<Ack>;

    async fn analytics(&self, window: TimeWindow) -> Result<AnalyticsSnapshot>;

    /// Raw `GET /health` payload.
    async fn health(&self) -> Result<Value>;
}

// ---------------------------------------------------------------------------
// Transition workflow
// ---------------------------------------------------------------------------

/// Select `key` and load its transitions.
///
/// A failed fetch leaves the workflow in `TransitionsReady` with no options.
pub async fn open_transitions<B>(
    backend: &B,
    workflow: &mut TransitionWorkflow,
    key: &str,
) -> transition::Result<WorkflowState>
where
    B: TicketBackend + ?Sized,
{
    workflow.select_ticket(key)?;
    match backend.transitions(key).await {
        Ok(set) => workflow.transitions_loaded(key, set),
        Err(err) => workflow.transitions_unavailable(key, &err.to_string()),
    }
}

/// Validate and send the selected transition, then reload the board with
/// `filter` once it went through.
///
/// Validation errors are returned before any request is made. A request
/// the backend refuses is recorded in the workflow, which returns to
/// `TransitionsReady`; check [`TransitionWorkflow::last_error`].
pub async fn submit_transition<B>(
    backend: &B,
    workflow: &mut TransitionWorkflow,
    state: &mut AppState,
    filter: &BoardFilter,
) -> transition::Result<WorkflowState>
where
    B: TicketBackend + ?Sized,
{
    let request = workflow.prepare_submission()?;
    let key = workflow.ticket_key().unwrap_or_default().to_string();

    match backend.transition(&key, &request).await {
        Ok(_) => {
            let next = workflow.submit_succeeded()?;
            if workflow.needs_board_reload() {
                refresh_board(backend, state, filter).await;
            }
            Ok(next)
        }
        Err(err) => {
            tracing::warn!(ticket = %key, transition = %request.transition_name, error = %err, "transition failed");
            workflow.submit_failed(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Refreshes
// ---------------------------------------------------------------------------

/// Reload the board. Returns `false` when a board refresh was already in
/// flight and nothing was requested.
pub async fn refresh_board<B>(backend: &B, state: &mut AppState, filter: &BoardFilter) -> bool
where
    B: TicketBackend + ?Sized,
{
    if !state.board.begin_refresh(filter) {
        return false;
    }
    let result = backend.list_tickets(filter).await;
    state.board.apply(result);
    true
}

/// Reload analytics for `window`. Returns `false` when an analytics refresh
/// was already in flight.
pub async fn refresh_analytics<B>(backend: &B, state: &mut AppState, window: TimeWindow) -> bool
where
    B: TicketBackend + ?Sized,
{
    if !state.analytics.begin_refresh(window) {
        return false;
    }
    let result = backend.analytics(window).await;
    state.analytics.apply(result);
    true
}

/// Probe `/health` and update the connectivity banner.
pub async fn check_health<B>(backend: &B, state: &mut AppState) -> Connectivity
where
    B: TicketBackend + ?Sized,
{
    let connectivity = match backend.health().await {
        Ok(payload) => Connectivity::from_health(&payload),
        Err(ClientError::Transport(err)) => {
            Connectivity::Degraded(format!("backend unreachable: {err}"))
        }
        Err(err) => Connectivity::Degraded(err.to_string()),
    };
    state.set_connectivity(connectivity.clone());
    connectivity
}
