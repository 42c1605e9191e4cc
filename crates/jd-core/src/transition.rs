//! Status transitions: which ones need a closure comment, and the
//! per-ticket workflow that drives a transition request.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::forms::ValidationError;
use crate::ordered::OrderedMap;

/// Lower-case fragments marking a transition that completes a ticket.
pub const CLOSURE_MARKERS: [&str; 5] = ["done", "terminé", "termine", "close", "resolve"];

/// Whether applying `transition_name` requires a closure comment.
pub fn requires_closure_comment(transition_name: &str) -> bool {
    let name = transition_name.to_lowercase();
    CLOSURE_MARKERS.iter().any(|marker| name.contains(marker))
}

// ---------------------------------------------------------------------------
// TransitionSet
// ---------------------------------------------------------------------------

/// Transitions offered by the tracker for one ticket: display name → id,
/// in the order the tracker listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionSet(OrderedMap<String>);

/// One offered transition with its derived comment requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOption {
    pub name: String,
    pub id: String,
    pub requires_comment: bool,
}

impl TransitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, id: impl Into<String>) {
        self.0.insert(name, id.into());
    }

    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys()
    }

    pub fn requires_comment(&self, name: &str) -> bool {
        self.contains(name) && requires_closure_comment(name)
    }

    pub fn entries(&self) -> Vec<TransitionOption> {
        self.0
            .iter()
            .map(|(name, id)| TransitionOption {
                name: name.to_string(),
                id: id.clone(),
                requires_comment: requires_closure_comment(name),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, I: Into<String>> FromIterator<(N, I)> for TransitionSet {
    fn from_iter<T: IntoIterator<Item = (N, I)>>(iter: T) -> Self {
        let mut set = TransitionSet::new();
        for (name, id) in iter {
            set.insert(name, id);
        }
        set
    }
}

/// Body of `POST /tickets/{key}/transition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub transition_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

// ---------------------------------------------------------------------------
// Workflow state & events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    LoadingTransitions,
    TransitionsReady,
    Submitting,
    Success,
    Failed,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkflowState::Idle => "Idle",
            WorkflowState::LoadingTransitions => "LoadingTransitions",
            WorkflowState::TransitionsReady => "TransitionsReady",
            WorkflowState::Submitting => "Submitting",
            WorkflowState::Success => "Success",
            WorkflowState::Failed => "Failed",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEvent {
    SelectTicket,
    TransitionsLoaded,
    TransitionsUnavailable,
    Submit,
    Succeeded,
    Rejected,
    Retry,
    Reset,
}

impl fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkflowEvent::SelectTicket => "SelectTicket",
            WorkflowEvent::TransitionsLoaded => "TransitionsLoaded",
            WorkflowEvent::TransitionsUnavailable => "TransitionsUnavailable",
            WorkflowEvent::Submit => "Submit",
            WorkflowEvent::Succeeded => "Succeeded",
            WorkflowEvent::Rejected => "Rejected",
            WorkflowEvent::Retry => "Retry",
            WorkflowEvent::Reset => "Reset",
        };
        write!(f, "{}", label)
    }
}

/// Errors raised by [`TransitionWorkflow`].
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// `event` is not valid while the workflow is in `state`; nothing changed.
    #[error("invalid transition: cannot apply {event} in state {state}")]
    InvalidTransition {
        state: WorkflowState,
        event: WorkflowEvent,
    },

    /// The form is incomplete; the request never left the workflow.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

// ---------------------------------------------------------------------------
// TransitionWorkflow
// ---------------------------------------------------------------------------

/// Transition workflow for the selected ticket.
///
/// ```text
/// Idle -> LoadingTransitions -> TransitionsReady -> Submitting -> Success
///                                      ^                |
///                                      +---- Failed <---+
/// ```
///
/// A failed fetch still lands in `TransitionsReady`, with no options. A
/// rejected submission passes through `Failed` and returns to
/// `TransitionsReady` keeping the chosen transition and comment.
#[derive(Debug, Clone)]
pub struct TransitionWorkflow {
    current: WorkflowState,
    ticket_key: Option<String>,
    transitions: TransitionSet,
    selected: Option<String>,
    comment: String,
    last_error: Option<String>,
    history: Vec<(WorkflowState, WorkflowEvent, WorkflowState)>,
}

impl TransitionWorkflow {
    pub fn new() -> Self {
        Self {
            current: WorkflowState::Idle,
            ticket_key: None,
            transitions: TransitionSet::new(),
            selected: None,
            comment: String::new(),
            last_error: None,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.current
    }

    pub fn ticket_key(&self) -> Option<&str> {
        self.ticket_key.as_deref()
    }

    pub fn transitions(&self) -> &TransitionSet {
        &self.transitions
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Message of the last failed submission, kept until the next submit.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn history(&self) -> &[(WorkflowState, WorkflowEvent, WorkflowState)] {
        &self.history
    }

    /// The board must be reloaded once a transition went through.
    pub fn needs_board_reload(&self) -> bool {
        self.current == WorkflowState::Success
    }

    /// Whether the selected transition demands a comment.
    pub fn comment_required(&self) -> bool {
        self.selected
            .as_deref()
            .is_some_and(|name| self.transitions.requires_comment(name))
    }

    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        self.current == WorkflowState::TransitionsReady && self.validate().is_ok()
    }

    fn step(&mut self, event: WorkflowEvent) -> Result<WorkflowState> {
        use WorkflowEvent as E;
        use WorkflowState as S;

        let next = match (self.current, event) {
            (S::Idle | S::TransitionsReady | S::Success, E::SelectTicket) => S::LoadingTransitions,
            (S::LoadingTransitions, E::SelectTicket) => S::LoadingTransitions,
            (S::LoadingTransitions, E::TransitionsLoaded | E::TransitionsUnavailable) => {
                S::TransitionsReady
            }
            (S::TransitionsReady, E::Submit) => S::Submitting,
            (S::Submitting, E::Succeeded) => S::Success,
            (S::Submitting, E::Rejected) => S::Failed,
            (S::Failed, E::Retry) => S::TransitionsReady,
            (s, E::Reset) if s != S::Submitting => S::Idle,
            (state, event) => return Err(WorkflowError::InvalidTransition { state, event }),
        };

        let from = self.current;
        self.current = next;
        self.history.push((from, event, next));
        tracing::debug!(from = %from, event = %event, to = %next, "transition workflow step");
        Ok(next)
    }

    /// Open the workflow for `key`; the caller then fetches its transitions.
    pub fn select_ticket(&mut self, key: impl Into<String>) -> Result<WorkflowState> {
        let state = self.step(WorkflowEvent::SelectTicket)?;
        self.ticket_key = Some(key.into());
        self.transitions = TransitionSet::new();
        self.selected = None;
        self.comment.clear();
        self.last_error = None;
        Ok(state)
    }

    /// Accept the transitions fetched for `key`.
    ///
    /// A response for a ticket that is no longer selected is ignored.
    pub fn transitions_loaded(&mut self, key: &str, set: TransitionSet) -> Result<WorkflowState> {
        if self.is_stale(key) {
            return Ok(self.current);
        }
        let state = self.step(WorkflowEvent::TransitionsLoaded)?;
        self.transitions = set;
        Ok(state)
    }

    /// The fetch failed: continue with no options rather than failing.
    pub fn transitions_unavailable(&mut self, key: &str, reason: &str) -> Result<WorkflowState> {
        if self.is_stale(key) {
            return Ok(self.current);
        }
        tracing::warn!(ticket = key, reason, "transitions unavailable, offering none");
        let state = self.step(WorkflowEvent::TransitionsUnavailable)?;
        self.transitions = TransitionSet::new();
        Ok(state)
    }

    fn is_stale(&self, key: &str) -> bool {
        let stale = self.ticket_key.as_deref() != Some(key);
        if stale {
            tracing::debug!(ticket = key, "ignoring transitions of a deselected ticket");
        }
        stale
    }

    pub fn choose(&mut self, transition_name: &str) -> Result<()> {
        self.require(WorkflowState::TransitionsReady, WorkflowEvent::Submit)?;
        if !self.transitions.contains(transition_name) {
            return Err(ValidationError::UnknownTransition(transition_name.to_string()).into());
        }
        self.selected = Some(transition_name.to_string());
        Ok(())
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<()> {
        self.require(WorkflowState::TransitionsReady, WorkflowEvent::Submit)?;
        self.comment = comment.into();
        Ok(())
    }

    fn require(&self, state: WorkflowState, event: WorkflowEvent) -> Result<()> {
        if self.current == state {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                state: self.current,
                event,
            })
        }
    }

    fn validate(&self) -> std::result::Result<TransitionRequest, ValidationError> {
        let name = self
            .selected
            .as_deref()
            .ok_or(ValidationError::NoTransitionSelected)?;
        if !self.transitions.contains(name) {
            return Err(ValidationError::UnknownTransition(name.to_string()));
        }

        let comment = self.comment.trim();
        if comment.is_empty() && requires_closure_comment(name) {
            return Err(ValidationError::ClosureCommentRequired {
                transition: name.to_string(),
            });
        }

        Ok(TransitionRequest {
            transition_name: name.to_string(),
            comment: (!comment.is_empty()).then(|| comment.to_string()),
        })
    }

    /// Validate the form and enter `Submitting`.
    ///
    /// On a validation error the workflow stays in `TransitionsReady`.
    pub fn prepare_submission(&mut self) -> Result<TransitionRequest> {
        self.require(WorkflowState::TransitionsReady, WorkflowEvent::Submit)?;
        let request = self.validate()?;
        self.step(WorkflowEvent::Submit)?;
        self.last_error = None;
        Ok(request)
    }

    pub fn submit_succeeded(&mut self) -> Result<WorkflowState> {
        self.step(WorkflowEvent::Succeeded)
    }

    /// Record a rejected submission and return to `TransitionsReady`.
    pub fn submit_failed(&mut self, message: impl Into<String>) -> Result<WorkflowState> {
        self.step(WorkflowEvent::Rejected)?;
        self.last_error = Some(message.into());
        self.step(WorkflowEvent::Retry)
    }

    pub fn reset(&mut self) -> Result<WorkflowState> {
        let state = self.step(WorkflowEvent::Reset)?;
        self.ticket_key = None;
        self.transitions = TransitionSet::new();
        self.selected = None;
        self.comment.clear();
        self.last_error = None;
        Ok(state)
    }
}

impl Default for TransitionWorkflow {
    fn default() -> Self {
        Self::new()
    }
}
