use jd_client::TicketClient;

use super::friendly_error;

/// Reference data the create and update forms offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Priorities,
    Types,
    Users(String),
}

/// Run the `lookup` subcommand.
pub async fn run(client: &TicketClient, lookup: &Lookup) -> anyhow::Result<()> {
    let lines = match lookup {
        Lookup::Priorities => client.priorities().await.map_err(friendly_error)?,
        Lookup::Types => client.issue_types().await.map_err(friendly_error)?,
        Lookup::Users(query) => client
            .search_users(query)
            .await
            .map_err(friendly_error)?
            .into_iter()
            .map(|u| format!("{:<24} {}", u.display_name, u.account_id))
            .collect(),
    };

    if lines.is_empty() {
        println!("Nothing found.");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{routing::get, Json, Router};
    use serde_json::json;

    use super::*;
    use crate::commands::test_support::serve;

    fn backend() -> Router {
        Router::new()
            .route(
                "/priorities",
                get(|| async { Json(json!({"success": true, "priorities": ["High", "Low"]})) }),
            )
            .route(
                "/issue-types",
                get(|| async { Json(json!({"success": true, "issue_types": []})) }),
            )
    }

    #[tokio::test]
    async fn lookups_print_reference_data() {
        let client = serve(backend()).await;
        assert!(run(&client, &Lookup::Priorities).await.is_ok());
        assert!(run(&client, &Lookup::Types).await.is_ok());
    }

    #[tokio::test]
    async fn blank_user_query_is_refused() {
        let client = serve(backend()).await;
        let err = run(&client, &Lookup::Users("  ".into())).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid query: query is required");
    }
}
