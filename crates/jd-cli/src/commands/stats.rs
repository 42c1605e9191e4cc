use jd_client::TicketClient;
use jd_core::facets::BoardStats;

use super::friendly_error;

/// Run the `stats` subcommand: per-status and per-assignee counts.
pub async fn run(client: &TicketClient) -> anyhow::Result<()> {
    let stats = client.stats().await.map_err(friendly_error)?;
    print!("{}", render(&stats));
    Ok(())
}

pub fn render(stats: &BoardStats) -> String {
    let mut out = format!("Total tickets: {}\n", stats.total_tickets);
    out.push_str(&format!("Unassigned:    {}\n", stats.unassigned_count));
    out.push_str("\nBy status:\n");
    for (status, count) in &stats.by_status {
        out.push_str(&format!("  {status:<20} {count}\n"));
    }
    if !stats.by_assignee.is_empty() {
        out.push_str("\nBy assignee:\n");
        for (assignee, count) in &stats.by_assignee {
            out.push_str(&format!("  {assignee:<20} {count}\n"));
        }
    }
    out
}
