use jd_client::backend::{open_transitions, submit_transition};
use jd_client::TicketClient;
use jd_core::facets::{BoardFilter, TicketBoard};
use jd_core::state::AppState;
use jd_core::ticket;
use jd_core::transition::{TransitionWorkflow, WorkflowError, WorkflowState};

/// Run the `transition` subcommand: move `key` through `name`.
///
/// Closing transitions (done, terminé, close, resolve...) need a comment.
pub async fn run(
    client: &TicketClient,
    key: &str,
    name: &str,
    comment: Option<&str>,
) -> anyhow::Result<()> {
    let mut workflow = TransitionWorkflow::new();
    open_transitions(client, &mut workflow, key).await?;
    if workflow.transitions().is_empty() {
        anyhow::bail!("No transitions available for {key}");
    }

    workflow.choose(name).map_err(explain)?;
    if let Some(comment) = comment {
        workflow.set_comment(comment)?;
    }

    let mut state = AppState::default();
    let next = submit_transition(client, &mut workflow, &mut state, &BoardFilter::default())
        .await
        .map_err(explain)?;
    if next != WorkflowState::Success {
        let reason = workflow.last_error().unwrap_or("unknown error");
        tracing::error!(ticket = key, transition = name, error = reason, "transition rejected");
        anyhow::bail!("Transition failed: {reason}");
    }

    match column_of(state.board.board(), key) {
        Some(status) => println!("{key} moved through \"{name}\", now in {status}."),
        None => println!("{key} moved through \"{name}\"."),
    }
    Ok(())
}

/// Status column holding `key` on a freshly loaded board.
pub fn column_of<'a>(board: &'a TicketBoard, key: &str) -> Option<&'a str> {
    board
        .iter()
        .find(|(_, tickets)| {
            tickets
                .iter()
                .any(|raw| ticket::parse_or_degraded(raw).key == key)
        })
        .map(|(status, _)| status.as_str())
}

fn explain(err: WorkflowError) -> anyhow::Error {
    match err {
        WorkflowError::Validation(v) => {
            anyhow::anyhow!("invalid {}: {v}", v.field())
        }
        other => other.into(),
    }
}
