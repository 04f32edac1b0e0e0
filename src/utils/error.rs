//! The `error` module defines the error types used by the `orion` messaging layer.
//!
//! Everything below `Dispatcher::dispatch` returns a `MessagingError`; `dispatch`
//! itself is the boundary that turns these into a log line and a boolean.

use thiserror::Error;

/// Errors raised while publishing an event to the STOMP broker.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The broker could not be reached, or the handshake / teardown failed.
    #[error("could not connect to broker at {addr}: {reason}")]
    ConnectFailed { addr: String, reason: String },

    /// The payload could not be encoded as JSON.
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The session was established but writing the SEND frame failed.
    #[error("failed to send frame to {destination}: {source}")]
    Send {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    /// The broker answered with something that is not a valid STOMP frame.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Every connect attempt failed.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<MessagingError>,
    },
}

impl MessagingError {
    pub fn connect_failed(addr: impl Into<String>, reason: impl ToString) -> Self {
        Self::ConnectFailed {
            addr: addr.into(),
            reason: reason.to_string(),
        }
    }

    /// Only connection failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectFailed { .. })
    }
}
