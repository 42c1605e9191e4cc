use jd_client::TicketClient;
use jd_core::details::{Timestamp, TicketDetails};

use super::friendly_error;

/// Run the `show` subcommand: print the details of one ticket.
pub async fn run(client: &TicketClient, key: &str) -> anyhow::Result<()> {
    let details = client.ticket_details(key).await.map_err(friendly_error)?;
    print!("{}", render(&details));
    Ok(())
}

fn when(ts: &Option<Timestamp>) -> String {
    match ts {
        Some(Timestamp::Parsed(at)) => at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Some(raw) => raw.to_string(),
        None => "-".to_string(),
    }
}

pub fn render(details: &TicketDetails) -> String {
    let mut out = format!("{}  {}\n", details.key, details.summary);
    out.push_str(&"-".repeat(40));
    out.push('\n');
    out.push_str(&format!("Status:    {}\n", details.status));
    out.push_str(&format!("Type:      {}\n", details.issue_type));
    out.push_str(&format!("Priority:  {}\n", details.priority));
    out.push_str(&format!("Assignee:  {}\n", details.assignee));
    out.push_str(&format!("Reporter:  {}\n", details.reporter));
    out.push_str(&format!("Project:   {}\n", details.project));
    out.push_str(&format!("Created:   {}\n", when(&details.created)));
    out.push_str(&format!("Updated:   {}\n", when(&details.updated)));
    if !details.description.is_empty() {
        out.push('\n');
        out.push_str(&details.description);
        out.push('\n');
    }
    out
}
