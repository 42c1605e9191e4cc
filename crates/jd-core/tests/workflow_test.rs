use jd_core::forms::ValidationError;
use jd_core::transition::{
    requires_closure_comment, TransitionSet, TransitionWorkflow, WorkflowError, WorkflowEvent,
    WorkflowState,
};

fn offered() -> TransitionSet {
    [("Start progress", "11"), ("Mark as Done", "31"), ("Reopen", "41")]
        .into_iter()
        .collect()
}

fn ready(key: &str) -> TransitionWorkflow {
    let mut wf = TransitionWorkflow::new();
    wf.select_ticket(key).unwrap();
    wf.transitions_loaded(key, offered()).unwrap();
    wf
}

#[test]
fn closure_comment_policy() {
    assert!(requires_closure_comment("Mark as Done"));
    assert!(requires_closure_comment("Resolve issue"));
    assert!(!requires_closure_comment("Reopen"));
}

#[test]
fn select_then_load() {
    let mut wf = TransitionWorkflow::new();
    assert_eq!(wf.state(), WorkflowState::Idle);

    let s = wf.select_ticket("PROJ-1").unwrap();
    assert_eq!(s, WorkflowState::LoadingTransitions);
    assert_eq!(wf.ticket_key(), Some("PROJ-1"));

    let s = wf.transitions_loaded("PROJ-1", offered()).unwrap();
    assert_eq!(s, WorkflowState::TransitionsReady);
    assert_eq!(wf.transitions().len(), 3);
}

#[test]
fn failed_fetch_degrades_to_empty_ready() {
    let mut wf = TransitionWorkflow::new();
    wf.select_ticket("PROJ-1").unwrap();
    let s = wf.transitions_unavailable("PROJ-1", "HTTP 500").unwrap();
    assert_eq!(s, WorkflowState::TransitionsReady);
    assert!(wf.transitions().is_empty());
    assert!(!wf.can_submit());
}

#[test]
fn stale_fetch_is_ignored() {
    let mut wf = TransitionWorkflow::new();
    wf.select_ticket("PROJ-1").unwrap();
    wf.select_ticket("PROJ-2").unwrap();

    let s = wf.transitions_loaded("PROJ-1", offered()).unwrap();
    assert_eq!(s, WorkflowState::LoadingTransitions);
    assert!(wf.transitions().is_empty());

    wf.transitions_loaded("PROJ-2", offered()).unwrap();
    // A late answer for the old ticket after the new one loaded.
    let s = wf.transitions_unavailable("PROJ-1", "timeout").unwrap();
    assert_eq!(s, WorkflowState::TransitionsReady);
    assert_eq!(wf.transitions().len(), 3);
}

#[test]
fn optional_comment_submission() {
    let mut wf = ready("PROJ-1");
    wf.choose("Start progress").unwrap();
    assert!(!wf.comment_required());
    assert!(wf.can_submit());

    let request = wf.prepare_submission().unwrap();
    assert_eq!(request.transition_name, "Start progress");
    assert_eq!(request.comment, None);
    assert_eq!(wf.state(), WorkflowState::Submitting);

    let s = wf.submit_succeeded().unwrap();
    assert_eq!(s, WorkflowState::Success);
    assert!(wf.needs_board_reload());
}

#[test]
fn closure_requires_comment() {
    let mut wf = ready("PROJ-1");
    wf.choose("Mark as Done").unwrap();
    assert!(wf.comment_required());
    wf.set_comment("   ").unwrap();
    assert!(!wf.can_submit());

    let err = wf.prepare_submission().unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::ClosureCommentRequired { .. })
    ));
    assert_eq!(wf.state(), WorkflowState::TransitionsReady);

    wf.set_comment("  shipped in 1.4  ").unwrap();
    let request = wf.prepare_submission().unwrap();
    assert_eq!(request.comment.as_deref(), Some("shipped in 1.4"));
}

#[test]
fn nothing_selected_is_rejected() {
    let mut wf = ready("PROJ-1");
    let err = wf.prepare_submission().unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::NoTransitionSelected)
    ));
}

#[test]
fn unknown_transition_is_rejected() {
    let mut wf = ready("PROJ-1");
    let err = wf.choose("Teleport").unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::UnknownTransition(_))
    ));
    assert_eq!(wf.selected(), None);
}

#[test]
fn failure_returns_to_ready_with_form_intact() {
    let mut wf = ready("PROJ-1");
    wf.choose("Mark as Done").unwrap();
    wf.set_comment("done").unwrap();
    wf.prepare_submission().unwrap();

    let s = wf.submit_failed("HTTP 409").unwrap();
    assert_eq!(s, WorkflowState::TransitionsReady);
    assert_eq!(wf.selected(), Some("Mark as Done"));
    assert_eq!(wf.comment(), "done");
    assert_eq!(wf.last_error(), Some("HTTP 409"));
    assert!(!wf.needs_board_reload());

    let events: Vec<WorkflowEvent> = wf.history().iter().map(|(_, e, _)| *e).collect();
    assert_eq!(
        &events[events.len() - 2..],
        &[WorkflowEvent::Rejected, WorkflowEvent::Retry]
    );
}

#[test]
fn invalid_event_leaves_state_unchanged() {
    let mut wf = TransitionWorkflow::new();
    let err = wf.submit_succeeded().unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    assert_eq!(wf.state(), WorkflowState::Idle);
    assert!(wf.history().is_empty());

    assert!(wf.choose("Start progress").is_err());
}

#[test]
fn success_allows_new_selection() {
    let mut wf = ready("PROJ-1");
    wf.choose("Reopen").unwrap();
    wf.prepare_submission().unwrap();
    wf.submit_succeeded().unwrap();

    wf.select_ticket("PROJ-2").unwrap();
    assert_eq!(wf.state(), WorkflowState::LoadingTransitions);
    assert_eq!(wf.selected(), None);
    assert!(wf.transitions().is_empty());
}

#[test]
fn reset_clears_everything() {
    let mut wf = ready("PROJ-1");
    wf.choose("Reopen").unwrap();
    let s = wf.reset().unwrap();
    assert_eq!(s, WorkflowState::Idle);
    assert_eq!(wf.ticket_key(), None);
    assert_eq!(wf.selected(), None);
}
