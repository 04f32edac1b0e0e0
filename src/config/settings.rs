use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for both the HTTP server and the STOMP messenger.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub messenger: MessengerSettings,
}

/// Configuration settings for the HTTP server.
///
/// Defines the bind address, log verbosity and the CORS origins allowed to call the API.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub log_level: String,
    pub origins: Vec<String>,
}

/// Connection parameters of the STOMP broker events are published to.
///
/// Loaded once at startup and shared read-only by every dispatch.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MessengerSettings {
    pub host: String,
    pub port: u16,
    pub connection_timeout_ms: u64,
    /// `(send, receive)` heart-beat intervals in milliseconds.
    pub heartbeat: (u64, u64),
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub default_destination: String,
}

impl ServerSettings {
    /// The level logging should start at; `debug` overrides `log_level`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug { "debug" } else { &self.log_level }
    }
}

impl MessengerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// Login and passcode, only when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub messenger: Option<PartialMessengerSettings>,
}

/// Partial server settings.
#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: Option<bool>,
    pub log_level: Option<String>,
    pub origins: Option<Vec<String>>,
}

/// Partial messenger settings.
///
/// The heart-beat pair is given as a two-element list (`heartbeat = [1000, 1000]`
/// in a file, `ORION_MESSENGER__HEARTBEAT=1000,1000` in the environment).
#[derive(Debug, Deserialize)]
pub struct PartialMessengerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub connection_timeout_ms: Option<u64>,
    pub heartbeat: Option<[u64; 2]>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
    pub default_destination: Option<String>,
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8000,
                debug: false,
                log_level: "info".to_string(),
                origins: vec!["*".to_string()],
            },
            messenger: MessengerSettings {
                host: "localhost".to_string(),
                port: 61613,
                connection_timeout_ms: 10_000,
                heartbeat: (0, 0),
                username: None,
                password: None,
                client_id: "orion".to_string(),
                default_destination: "/queue/pipeline.ingest".to_string(),
            },
        }
    }
}
