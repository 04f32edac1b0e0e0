//! Event producer
//!
//! Publishes JSON events to the STOMP broker:
//! - serializes the payload and merges caller headers over the defaults
//! - opens one connection per publish and always releases it
//! - retries connect failures a fixed number of times with a fixed delay
//!
//! `Dispatcher::dispatch` never returns an error. Failures are logged and
//! reported as `false`; callers that need the cause use `try_dispatch`.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::MessengerSettings;
use crate::messaging::connection::ConnectionManager;
use crate::transport::{Connector, Headers, StompConnector};
use crate::utils::MessagingError;

/// Headers every event is sent with unless the caller overrides them.
pub const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("content-type", "application/json"),
    ("persistent", "true"),
];

/// Longest body prefix written to the debug log.
pub const MAX_LOG_BODY: usize = 100;

/// Returns a fresh header map: the defaults overlaid by `extra`.
pub fn build_headers(extra: Option<&Headers>) -> Headers {
    let mut headers: Headers = DEFAULT_HEADERS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    if let Some(extra) = extra {
        headers.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    headers
}

/// The body as logged: at most `MAX_LOG_BODY` characters, then `...` if cut.
pub fn log_snippet(body: &str) -> Cow<'_, str> {
    match body.char_indices().nth(MAX_LOG_BODY) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &body[..cut])),
        None => Cow::Borrowed(body),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Publishes events to the broker. Cheap to clone.
pub struct Dispatcher<C: Connector = StompConnector> {
    connections: Arc<ConnectionManager<C>>,
    retry: RetryPolicy,
}

impl<C: Connector> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            connections: self.connections.clone(),
            retry: self.retry,
        }
    }
}

impl Dispatcher<StompConnector> {
    pub fn new(settings: Arc<MessengerSettings>) -> Self {
        Self::with_connector(StompConnector, settings)
    }
}

impl<C: Connector> Dispatcher<C> {
    pub fn with_connector(connector: C, settings: Arc<MessengerSettings>) -> Self {
        Self::from_manager(ConnectionManager::new(connector, settings))
    }

    pub fn from_manager(connections: ConnectionManager<C>) -> Self {
        Self {
            connections: Arc::new(connections),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn default_destination(&self) -> &str {
        &self.connections.settings().default_destination
    }

    /// Sends `body` to `destination`, retrying only connect failures.
    ///
    /// Any other error is returned from the attempt that produced it. When
    /// every attempt fails to connect the last failure is wrapped in
    /// `RetriesExhausted`.
    pub async fn publish(
        &self,
        destination: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<(), MessagingError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self
                .connections
                .send_scoped(destination, body, headers)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        "Attempt {}/{} to reach broker failed: {}; retrying in {:?}",
                        attempt, max_attempts, e, self.retry.delay
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => {
                    return Err(MessagingError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Serializes and publishes `payload`, reporting the cause on failure.
    ///
    /// `destination` defaults to the configured default destination.
    pub async fn try_dispatch<T>(
        &self,
        payload: &T,
        destination: Option<&str>,
        headers: Option<&Headers>,
    ) -> Result<(), MessagingError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let destination = destination.unwrap_or_else(|| self.default_destination());
        let body = serde_json::to_string(payload)?;
        let headers = build_headers(headers);

        self.publish(destination, &body, &headers).await?;
        debug!("Event sent to {}: {}", destination, log_snippet(&body));
        Ok(())
    }

    /// Serializes and publishes `payload`. Returns `false` on any failure.
    pub async fn dispatch<T>(
        &self,
        payload: &T,
        destination: Option<&str>,
        headers: Option<&Headers>,
    ) -> bool
    where
        T: Serialize + Sync + ?Sized,
    {
        match self.try_dispatch(payload, destination, headers).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to send event: {}", e);
                false
            }
        }
    }

    /// A dispatcher with destination and headers fixed.
    pub fn create_dispatcher(
        &self,
        destination: impl Into<String>,
        headers: Option<Headers>,
    ) -> BoundDispatcher<C> {
        BoundDispatcher {
            dispatcher: self.clone(),
            destination: destination.into(),
            headers,
        }
    }
}

/// Returned by [`Dispatcher::create_dispatcher`].
pub struct BoundDispatcher<C: Connector = StompConnector> {
    dispatcher: Dispatcher<C>,
    destination: String,
    headers: Option<Headers>,
}

impl<C: Connector> Clone for BoundDispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            destination: self.destination.clone(),
            headers: self.headers.clone(),
        }
    }
}

impl<C: Connector> BoundDispatcher<C> {
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub async fn dispatch<T>(&self, payload: &T) -> bool
    where
        T: Serialize + Sync + ?Sized,
    {
        self.dispatcher
            .dispatch(payload, Some(&self.destination), self.headers.as_ref())
            .await
    }
}
