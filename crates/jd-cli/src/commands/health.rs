use jd_client::backend::check_health;
use jd_client::TicketClient;
use jd_core::state::{AppState, Connectivity};

/// Run the `health` subcommand. A degraded backend is reported, not failed.
pub async fn run(client: &TicketClient) -> anyhow::Result<()> {
    let mut state = AppState::default();
    let connectivity = check_health(client, &mut state).await;
    println!("{}", describe(&connectivity));
    Ok(())
}

pub fn describe(connectivity: &Connectivity) -> String {
    match connectivity.banner() {
        Some(banner) => banner,
        None if *connectivity == Connectivity::Connected => {
            "Ticket service connected; all operations available".to_string()
        }
        None => "Ticket service status unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    use super::*;
    use crate::commands::test_support::serve;

    #[test]
    fn describe_each_state() {
        assert!(describe(&Connectivity::Connected).contains("connected"));
        assert_eq!(describe(&Connectivity::Unknown), "Ticket service status unknown");
        assert_eq!(
            describe(&Connectivity::Degraded("tracker disconnected".into())),
            "Ticket service unavailable (tracker disconnected); creation disabled"
        );
    }

    #[tokio::test]
    async fn unhealthy_backend_is_not_an_error() {
        let client = serve(Router::new().route(
            "/health",
            get(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({"status": "unhealthy", "error": "Jira injoignable"})),
                )
            }),
        ))
        .await;

        assert!(run(&client).await.is_ok());
    }
}
