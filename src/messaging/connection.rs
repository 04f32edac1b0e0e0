//! Scoped broker connections.
//!
//! `ConnectionManager::acquire` hands out a `ScopedConnection`, which is the
//! only owner of the underlying session. `ScopedConnection::release` consumes
//! the guard, so a session cannot be used after it has been disconnected.

use std::sync::Arc;

use tracing::{error, warn};

use crate::config::MessengerSettings;
use crate::transport::{
    ConnectRequest, ConnectionListener, Connector, Headers, LoggingListener, Session,
};
use crate::utils::MessagingError;

pub struct ConnectionManager<C: Connector> {
    connector: C,
    settings: Arc<MessengerSettings>,
    listener: Arc<dyn ConnectionListener>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, settings: Arc<MessengerSettings>) -> Self {
        Self {
            connector,
            settings,
            listener: Arc::new(LoggingListener),
        }
    }

    /// Replaces the default logging observer.
    pub fn with_listener(mut self, listener: Arc<dyn ConnectionListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn settings(&self) -> &MessengerSettings {
        &self.settings
    }

    /// Handshake parameters derived from the messenger settings.
    ///
    /// Credentials are only sent when both username and password are set;
    /// the `client-id` header is always present.
    pub fn connect_request(&self) -> ConnectRequest {
        let mut headers = Headers::new();
        headers.insert("client-id".to_string(), self.settings.client_id.clone());

        ConnectRequest {
            host: self.settings.host.clone(),
            port: self.settings.port,
            timeout: self.settings.connection_timeout(),
            heartbeat: self.settings.heartbeat,
            credentials: self
                .settings
                .credentials()
                .map(|(login, passcode)| (login.to_string(), passcode.to_string())),
            headers,
        }
    }

    /// Opens a session, failing with `ConnectFailed` if the handshake does not complete.
    pub async fn acquire(&self) -> Result<ScopedConnection<C::Session>, MessagingError> {
        let session = self
            .connector
            .connect(&self.connect_request(), self.listener.clone())
            .await?;
        Ok(ScopedConnection {
            session: Some(session),
        })
    }

    /// Acquires a connection, sends one message over it and releases it,
    /// whether or not the send succeeded.
    pub async fn send_scoped(
        &self,
        destination: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<(), MessagingError> {
        let mut conn = self.acquire().await?;
        let sent = conn.send(destination, body, headers).await;
        conn.release().await;
        sent
    }
}

/// A connected session owned by the scope that acquired it.
pub struct ScopedConnection<S: Session> {
    session: Option<S>,
}

impl<S: Session> ScopedConnection<S> {
    pub async fn send(
        &mut self,
        destination: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<(), MessagingError> {
        match self.session.as_mut() {
            Some(session) => session.send(destination, body, headers).await,
            None => Err(MessagingError::Protocol(
                "send on a released connection".to_string(),
            )),
        }
    }

    /// Disconnects from the broker. Never fails: errors are logged and dropped.
    pub async fn release(mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        match session.disconnect().await {
            Ok(()) => {}
            Err(e) if e.is_retryable() => warn!("Failed to disconnect from broker: {}", e),
            Err(e) => error!("Failed to disconnect from broker: {}", e),
        }
    }
}

impl<S: Session> Drop for ScopedConnection<S> {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("Broker connection dropped without disconnect; closing socket");
        }
    }
}
