pub mod analytics;
pub mod board;
pub mod create;
pub mod delete;
pub mod facets;
pub mod health;
pub mod lookup;
pub mod show;
pub mod stats;
pub mod transition;
pub mod transitions;
pub mod update;

use jd_client::{ClientError, TicketClient};
use jd_core::config::ApiConfig;

/// Build the backend client from the `[api]` section.
pub fn api_client(config: &ApiConfig) -> anyhow::Result<TicketClient> {
    TicketClient::new(config).map_err(friendly_error)
}

/// Map client errors to user-friendly messages.
pub fn friendly_error(err: ClientError) -> anyhow::Error {
    match err {
        ClientError::Transport(e) if e.is_connect() => anyhow::anyhow!(
            "Could not connect to the ticket backend. Is it running?\n  \
             (hint: check --api-url or [api] base_url in ~/.jiradeck/config.toml)"
        ),
        ClientError::Transport(e) if e.is_timeout() => {
            anyhow::anyhow!("Request timed out. The backend or the tracker may be overloaded.")
        }
        ClientError::Validation(v) => anyhow::anyhow!("invalid {}: {v}", v.field()),
        other => anyhow::anyhow!("API request failed: {other}"),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use jd_client::TicketClient;
    use jd_core::config::ApiConfig;

    /// Serve `api` under `/api` on an ephemeral port and return a client for it.
    pub async fn serve(api: axum::Router) -> TicketClient {
        let app = axum::Router::new().nest("/api", api);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TicketClient::new(&ApiConfig {
            base_url: format!("http://{addr}/api"),
            timeout_secs: 5,
        })
        .unwrap()
    }
}
