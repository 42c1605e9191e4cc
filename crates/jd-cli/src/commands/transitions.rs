use jd_client::backend::open_transitions;
use jd_client::TicketClient;
use jd_core::transition::{TransitionSet, TransitionWorkflow};

/// Run the `transitions` subcommand: list the transitions offered for `key`.
///
/// An unavailable list is reported as empty, not as an error.
pub async fn run(client: &TicketClient, key: &str) -> anyhow::Result<()> {
    let mut workflow = TransitionWorkflow::new();
    open_transitions(client, &mut workflow, key).await?;
    print!("{}", render(key, workflow.transitions()));
    Ok(())
}

pub fn render(key: &str, transitions: &TransitionSet) -> String {
    if transitions.is_empty() {
        return format!("No transitions available for {key}.\n");
    }
    let mut out = format!("Transitions for {key}:\n");
    for option in transitions.entries() {
        let note = if option.requires_comment {
            "  (comment required)"
        } else {
            ""
        };
        out.push_str(&format!("  {:<24} id={}{note}\n", option.name, option.id));
    }
    out
}
