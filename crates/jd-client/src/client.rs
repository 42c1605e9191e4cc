//! HTTP client for the ticket backend REST API (`/api`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use jd_core::analytics::AnalyticsSnapshot;
use jd_core::config::ApiConfig;
use jd_core::details::TicketDetails;
use jd_core::facets::{BoardFilter, BoardStats, TicketBoard};
use jd_core::forms::{NewTicketForm, TicketUpdate, ValidationError};
use jd_core::history::TimeWindow;
use jd_core::transition::{requires_closure_comment, TransitionRequest, TransitionSet};

use crate::backend::TicketBackend;
use crate::error::{ClientError, Result};

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Acknowledgement of a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub account_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email_address: String,
}

#[derive(Deserialize)]
struct DetailsEnvelope {
    #[serde(default)]
    ticket: Value,
}

#[derive(Deserialize)]
struct TransitionsEnvelope {
    #[serde(default)]
    transitions: TransitionSet,
}

#[derive(Deserialize)]
struct PrioritiesEnvelope {
    #[serde(default)]
    priorities: Vec<String>,
}

#[derive(Deserialize)]
struct IssueTypesEnvelope {
    #[serde(default)]
    issue_types: Vec<String>,
}

#[derive(Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: Vec<UserSummary>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Reusable async client + base URL (including the `/api` prefix).
#[derive(Debug, Clone)]
pub struct TicketClient {
    http: reqwest::Client,
    base: String,
}

impl TicketClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(http, &config.base_url))
    }

    pub fn with_client(http: reqwest::Client, base: &str) -> Self {
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn ticket_path(key: &str, suffix: &str) -> String {
        format!("/tickets/{}{}", urlencoding::encode(key.trim()), suffix)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!(path, "GET");
        let resp = self
            .http
            .get(self.url(path))
            .header("Accept", "application/json")
            .send()
            .await?;
        read_json(resp).await
    }

    // -- tickets ------------------------------------------------------------

    /// `GET /tickets/{key}/details`
    pub async fn ticket_details(&self, key: &str) -> Result<TicketDetails> {
        let body: Value = self.get_json(&Self::ticket_path(key, "/details")).await?;
        check_success(&body)?;
        let envelope: DetailsEnvelope = serde_json::from_value(body)?;
        Ok(TicketDetails::from_value(key, &envelope.ticket))
    }

    /// `POST /tickets`. The form is validated first.
    pub async fn create_ticket(&self, form: &NewTicketForm) -> Result<Ack> {
        let ticket = form.validate()?;
        tracing::debug!(path = "/tickets", "POST");
        let resp = self.http.post(self.url("/tickets")).json(&ticket).send().await?;
        let ack = read_ack(resp).await?;
        tracing::info!(summary = %ticket.summary, issue_type = %ticket.issue_type, "ticket created");
        Ok(ack)
    }

    /// `PUT /tickets/{key}` with only the changed fields.
    pub async fn update_ticket(&self, key: &str, update: &TicketUpdate) -> Result<Ack> {
        if update.is_empty() {
            return Err(ValidationError::NothingToUpdate.into());
        }
        let path = Self::ticket_path(key, "");
        tracing::debug!(path = %path, "PUT");
        let resp = self.http.put(self.url(&path)).json(update).send().await?;
        let ack = read_ack(resp).await?;
        tracing::info!(ticket = key, "ticket updated");
        Ok(ack)
    }

    /// `DELETE /tickets/{key}`
    pub async fn delete_ticket(&self, key: &str) -> Result<Ack> {
        let path = Self::ticket_path(key, "");
        tracing::debug!(path = %path, "DELETE");
        let resp = self.http.delete(self.url(&path)).send().await?;
        let ack = read_ack(resp).await?;
        tracing::info!(ticket = key, "ticket deleted");
        Ok(ack)
    }

    // -- reference data -----------------------------------------------------

    /// `GET /priorities`
    pub async fn priorities(&self) -> Result<Vec<String>> {
        let body: Value = self.get_json("/priorities").await?;
        check_success(&body)?;
        let envelope: PrioritiesEnvelope = serde_json::from_value(body)?;
        Ok(envelope.priorities)
    }

    /// `GET /issue-types`
    pub async fn issue_types(&self) -> Result<Vec<String>> {
        let body: Value = self.get_json("/issue-types").await?;
        check_success(&body)?;
        let envelope: IssueTypesEnvelope = serde_json::from_value(body)?;
        Ok(envelope.issue_types)
    }

    /// `GET /users?query=`, used to resolve an assignee's account id.
    pub async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::Required { field: "query" }.into());
        }
        let path = format!("/users?query={}", urlencoding::encode(query));
        let body: Value = self.get_json(&path).await?;
        check_success(&body)?;
        let envelope: UsersEnvelope = serde_json::from_value(body)?;
        Ok(envelope.users)
    }

    /// `GET /stats`
    pub async fn stats(&self) -> Result<BoardStats> {
        let body: Value = self.get_json("/stats").await?;
        check_success(&body)?;
        Ok(serde_json::from_value(body)?)
    }
}

#[async_trait]
impl TicketBackend for TicketClient {
    /// `GET /tickets` with the active filter criteria as query parameters.
    async fn list_tickets(&self, filter: &BoardFilter) -> Result<TicketBoard> {
        let params: Vec<(&str, &str)> = [
            ("search", filter.search.trim()),
            ("assignee", filter.assignee.trim()),
            ("type", filter.issue_type.trim()),
            ("status", filter.status.trim()),
            ("priority", filter.priority.trim()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect();

        tracing::debug!(path = "/tickets", ?params, "GET");
        let resp = self
            .http
            .get(self.url("/tickets"))
            .query(&params)
            .send()
            .await?;
        let body: Value = read_json(resp).await?;
        check_success(&body)?;
        Ok(serde_json::from_value(body)?)
    }

    /// `GET /tickets/{key}/transitions`
    async fn transitions(&self, key: &str) -> Result<TransitionSet> {
        let body: Value = self.get_json(&Self::ticket_path(key, "/transitions")).await?;
        check_success(&body)?;
        let envelope: TransitionsEnvelope = serde_json::from_value(body)?;
        Ok(envelope.transitions)
    }

    /// `POST /tickets/{key}/transition`. A closing transition without a
    /// comment is refused before any request is made.
    async fn transition(&self, key: &str, request: &TransitionRequest) -> Result<Ack> {
        let name = request.transition_name.trim();
        if name.is_empty() {
            return Err(ValidationError::NoTransitionSelected.into());
        }
        let has_comment = request
            .comment
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if requires_closure_comment(name) && !has_comment {
            return Err(ValidationError::ClosureCommentRequired {
                transition: name.to_string(),
            }
            .into());
        }

        let path = Self::ticket_path(key, "/transition");
        tracing::debug!(path = %path, "POST");
        let resp = self.http.post(self.url(&path)).json(request).send().await?;
        let ack = read_ack(resp).await?;
        tracing::info!(ticket = key, transition = name, "ticket transitioned");
        Ok(ack)
    }

    /// `GET /analytics`, or `GET /analytics/filtered?time=` for a bounded window.
    async fn analytics(&self, window: TimeWindow) -> Result<AnalyticsSnapshot> {
        let path = match window {
            TimeWindow::All => "/analytics".to_string(),
            other => format!("/analytics/filtered?time={other}"),
        };
        let body: Value = self.get_json(&path).await?;
        check_success(&body)?;
        Ok(serde_json::from_value(body)?)
    }

    /// `GET /health`
    async fn health(&self) -> Result<Value> {
        self.get_json("/health").await
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    if !status.is_success() {
        return Err(http_error(status, &bytes));
    }
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_ack(resp: Response) -> Result<Ack> {
    let body: Value = read_json(resp).await?;
    check_success(&body)?;
    Ok(Ack {
        message: message_of(&body),
    })
}

fn http_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| message_of(&v))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    tracing::debug!(status = status.as_u16(), %message, "backend returned an error");
    ClientError::Http {
        status: status.as_u16(),
        message,
    }
}

/// The `message` field of a JSON body, else its `error` field.
fn message_of(body: &Value) -> Option<String> {
    ["message", "error"].iter().find_map(|field| {
        body.get(*field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    })
}

fn check_success(body: &Value) -> Result<()> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ClientError::Rejected {
            message: message_of(body).unwrap_or_else(|| "request rejected by the backend".into()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_prefers_message_over_error() {
        let body = json!({"error": "Permission refusée", "message": "Accès interdit"});
        assert_eq!(message_of(&body).as_deref(), Some("Accès interdit"));
        let body = json!({"error": "Ticket non trouvé"});
        assert_eq!(message_of(&body).as_deref(), Some("Ticket non trouvé"));
        assert_eq!(message_of(&json!({"message": "  "})), None);
    }

    #[test]
    fn http_error_falls_back_to_status() {
        let err = http_error(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err.to_string(), "HTTP 502");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn success_false_is_rejected() {
        let err = check_success(&json!({"success": false, "error": "Échec"})).unwrap_err();
        assert!(matches!(err, ClientError::Rejected { .. }));
        assert!(check_success(&json!({"To Do": []})).is_ok());
    }

    #[test]
    fn keys_are_path_encoded() {
        assert_eq!(TicketClient::ticket_path(" A B ", "/details"), "/tickets/A%20B/details");
    }

    #[test]
    fn base_url_is_trimmed() {
        let client = TicketClient::with_client(reqwest::Client::new(), "http://localhost:5000/api/");
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }
}
