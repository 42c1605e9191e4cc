use jd_client::backend::refresh_board;
use jd_client::TicketClient;
use jd_core::facets::{BoardFilter, FilterFacets};
use jd_core::state::AppState;

/// Run the `facets` subcommand: show the filter values the board offers.
pub async fn run(client: &TicketClient, default_types: &[String]) -> anyhow::Result<()> {
    let mut state = AppState::default();
    refresh_board(client, &mut state, &BoardFilter::default()).await;
    if let Some(err) = state.board.error() {
        anyhow::bail!("Failed to load tickets: {err}");
    }

    print!("{}", render(state.board.facets(), default_types));
    Ok(())
}

pub fn render(facets: &FilterFacets, default_types: &[String]) -> String {
    let join = |values: Vec<String>| {
        if values.is_empty() {
            "-".to_string()
        } else {
            values.join(", ")
        }
    };

    let mut out = String::new();
    out.push_str(&format!("Statuses:   {}\n", join(facets.statuses.clone())));
    out.push_str(&format!(
        "Assignees:  {}\n",
        join(facets.assignees.iter().cloned().collect())
    ));
    out.push_str(&format!(
        "Types:      {}\n",
        join(facets.types_or_default(default_types).into_iter().collect())
    ));
    out.push_str(&format!(
        "Priorities: {}\n",
        join(facets.priorities_by_severity())
    ));
    out
}
