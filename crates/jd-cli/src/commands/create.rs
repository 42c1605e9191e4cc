use jd_client::backend::check_health;
use jd_client::TicketClient;
use jd_core::forms::NewTicketForm;
use jd_core::state::AppState;

use super::friendly_error;

/// Run the `create` subcommand.
///
/// Creation is refused while the backend reports the tracker as
/// disconnected.
pub async fn run(client: &TicketClient, form: NewTicketForm) -> anyhow::Result<()> {
    let mut state = AppState::default();
    check_health(client, &mut state).await;
    if let Some(banner) = state.connectivity.banner() {
        anyhow::bail!("{banner}");
    }

    let ack = client.create_ticket(&form).await.map_err(friendly_error)?;
    println!(
        "{}",
        ack.message.as_deref().unwrap_or("Ticket created.")
    );
    Ok(())
}
