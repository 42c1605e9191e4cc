//! Async client for the ticket backend and the drivers that feed its
//! responses into the presentation state.

pub mod backend;
pub mod client;
pub mod error;

pub use backend::TicketBackend;
pub use client::TicketClient;
pub use error::{ClientError, ErrorKind, Result};
