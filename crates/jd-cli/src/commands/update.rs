use jd_client::TicketClient;
use jd_core::forms::{TicketFields, TicketUpdate};

use super::friendly_error;

/// Field values given on the command line; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct FieldOverrides {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub issue_type: Option<String>,
    pub assignee: Option<String>,
}

impl FieldOverrides {
    fn apply(&self, original: &TicketFields) -> TicketFields {
        let pick = |value: &Option<String>, current: &String| {
            value.clone().unwrap_or_else(|| current.clone())
        };
        TicketFields {
            summary: pick(&self.summary, &original.summary),
            description: pick(&self.description, &original.description),
            priority: pick(&self.priority, &original.priority),
            issue_type: pick(&self.issue_type, &original.issue_type),
            assignee: pick(&self.assignee, &original.assignee),
        }
    }
}

/// Run the `update` subcommand: send only the fields that differ from the
/// ticket's current values.
pub async fn run(client: &TicketClient, key: &str, overrides: &FieldOverrides) -> anyhow::Result<()> {
    let original = client
        .ticket_details(key)
        .await
        .map_err(friendly_error)?
        .fields();
    let update = TicketUpdate::from_edit(&original, &overrides.apply(&original))
        .map_err(|e| friendly_error(e.into()))?;

    let ack = client
        .update_ticket(key, &update)
        .await
        .map_err(friendly_error)?;
    println!(
        "{}",
        ack.message
            .unwrap_or_else(|| format!("Ticket {key} updated."))
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, routing::get, Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::commands::test_support::serve;

    type Sent = Arc<Mutex<Vec<Value>>>;

    fn backend(sent: Sent) -> Router {
        Router::new()
            .route(
                "/tickets/{key}/details",
                get(|| async {
                    Json(json!({"success": true, "ticket": {
                        "summary": "Fix login",
                        "priority": "High",
                        "issueType": "Bug",
                        "assignee": "Alice"
                    }}))
                }),
            )
            .route(
                "/tickets/{key}",
                axum::routing::put(
                    |State(sent): State<Sent>, Json(body): Json<Value>| async move {
                        sent.lock().unwrap().push(body);
                        Json(json!({"success": true}))
                    },
                ),
            )
            .with_state(sent)
    }

    #[tokio::test]
    async fn update_sends_changed_fields_only() {
        let sent: Sent = Arc::new(Mutex::new(Vec::new()));
        let client = serve(backend(sent.clone())).await;

        let overrides = FieldOverrides {
            priority: Some("Low".into()),
            assignee: Some("Alice".into()),
            ..FieldOverrides::default()
        };
        run(&client, "PROJ-1", &overrides).await.unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0], json!({"priority": "Low"}));
    }

    #[tokio::test]
    async fn update_without_changes_is_refused() {
        let sent: Sent = Arc::new(Mutex::new(Vec::new()));
        let client = serve(backend(sent.clone())).await;

        let overrides = FieldOverrides {
            summary: Some("Fix login".into()),
            ..FieldOverrides::default()
        };
        let err = run(&client, "PROJ-1", &overrides).await.unwrap_err();
        assert!(err.to_string().contains("at least one field must change"));
        assert!(sent.lock().unwrap().is_empty());
    }
}
