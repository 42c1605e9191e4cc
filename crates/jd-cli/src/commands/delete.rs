use jd_client::TicketClient;

use super::friendly_error;

/// Run the `delete` subcommand. Nothing is sent unless `confirmed`.
pub async fn run(client: &TicketClient, key: &str, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        anyhow::bail!("Refusing to delete {key} without confirmation (pass --yes)");
    }

    let ack = client.delete_ticket(key).await.map_err(friendly_error)?;
    println!(
        "{}",
        ack.message
            .unwrap_or_else(|| format!("Ticket {key} deleted."))
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{extract::State, routing::delete, Json, Router};
    use serde_json::json;

    use super::*;
    use crate::commands::test_support::serve;

    fn backend(calls: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/tickets/{key}",
                delete(|State(calls): State<Arc<AtomicUsize>>| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"success": true, "message": "Ticket supprimé"}))
                }),
            )
            .with_state(calls)
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = serve(backend(calls.clone())).await;

        assert!(run(&client, "PROJ-1", false).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        run(&client, "PROJ-1", true).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
