use jd_client::backend::refresh_board;
use jd_client::TicketClient;
use jd_core::facets::{filter_board, order_statuses, BoardFilter, TicketBoard};
use jd_core::state::AppState;
use jd_core::ticket::{self, TicketRecord};

/// Run the `board` subcommand: list tickets grouped by status.
pub async fn run(client: &TicketClient, filter: &BoardFilter) -> anyhow::Result<()> {
    let mut state = AppState::default();
    refresh_board(client, &mut state, filter).await;
    if let Some(err) = state.board.error() {
        tracing::error!(error = err, "board refresh failed");
        anyhow::bail!("Failed to load tickets: {err}");
    }

    // Older listing endpoints ignore the priority parameter.
    if filter.priority.trim().is_empty() {
        print!("{}", render(state.board.board(), &state.board.facets().statuses));
    } else {
        let board = filter_board(state.board.board(), filter);
        print!("{}", render(&board, &order_statuses(board.keys())));
    }
    Ok(())
}

fn line(record: &TicketRecord) -> String {
    let mut tags = vec![record.assignee.as_str()];
    if !record.issue_type.is_empty() {
        tags.push(record.issue_type.as_str());
    }
    tags.push(record.priority.as_str());
    format!("  {:<10} {}  [{}]", record.key, record.summary, tags.join(" / "))
}

/// Columns in workflow order; an empty board prints a single notice.
pub fn render(board: &TicketBoard, statuses: &[String]) -> String {
    if board.values().all(Vec::is_empty) {
        return "No tickets match.\n".to_string();
    }

    let mut out = String::new();
    for status in statuses {
        let tickets = board.get(status).map(Vec::as_slice).unwrap_or_default();
        out.push_str(&format!("{status} ({})\n", tickets.len()));
        for raw in tickets {
            out.push_str(&line(&ticket::parse_or_degraded(raw)));
            out.push('\n');
        }
    }
    out
}
