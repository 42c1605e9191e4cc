use jd_core::forms::ValidationError;
use thiserror::Error;

/// Errors that can occur when talking to the ticket backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with a non-2xx status.
    ///
    /// `message` comes from the `message` or `error` field of the JSON body,
    /// or is `"HTTP <status>"` when the body carries neither.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Network failure: connection refused, timeout, TLS, body read.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A 2xx response that reported `success: false`.
    #[error("{message}")]
    Rejected { message: String },

    /// The request was refused locally and never sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// How a failure is presented to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Dismissible message in the affected view.
    Transport,
    /// Inline message next to the offending form field.
    Validation,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Transport,
        }
    }

    /// HTTP status of the response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
