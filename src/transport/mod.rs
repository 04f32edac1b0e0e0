//! The `transport` module is responsible for network communication with the
//! STOMP broker.
//!
//! It defines the frame codec, the `Connector`/`Session` seam the messaging
//! layer publishes through, and the TCP implementation of that seam.

pub mod frame;
pub mod listener;
pub mod stomp;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::utils::MessagingError;

pub use listener::{ConnectionListener, LoggingListener};
pub use stomp::{StompConnector, StompSession};

/// Frame headers, kept ordered so frames encode deterministically.
pub type Headers = BTreeMap<String, String>;

/// Everything needed to open one broker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    /// `(send, receive)` heart-beat intervals in milliseconds.
    pub heartbeat: (u64, u64),
    /// `(login, passcode)`; `None` connects anonymously.
    pub credentials: Option<(String, String)>,
    /// Extra CONNECT headers, e.g. `client-id`.
    pub headers: Headers,
}

impl ConnectRequest {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Opens broker sessions. The TCP implementation is [`StompConnector`].
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Session: Session;

    /// Performs the connection handshake, failing with
    /// [`MessagingError::ConnectFailed`] when it cannot complete.
    async fn connect(
        &self,
        request: &ConnectRequest,
        listener: Arc<dyn ConnectionListener>,
    ) -> Result<Self::Session, MessagingError>;
}

/// A live broker session.
#[async_trait]
pub trait Session: Send + 'static {
    async fn send(
        &mut self,
        destination: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<(), MessagingError>;

    async fn disconnect(&mut self) -> Result<(), MessagingError>;
}
