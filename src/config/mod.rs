mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{MessengerSettings, ServerSettings, Settings};

/// Environment files read at startup, most specific first.
pub const ENV_FILES: [&str; 2] = [".env.local", ".env"];

/// Loads `.env.local` and `.env` into the process environment.
///
/// Variables already set win over file values, and earlier files win over
/// later ones. Missing files are skipped. Files that fail to parse are
/// reported in the returned list, since this runs before logging is set up.
pub fn load_env_files() -> Vec<String> {
    let mut warnings = Vec::new();
    for file in ENV_FILES {
        if let Err(e) = dotenvy::from_filename(file) {
            if !e.not_found() {
                warnings.push(format!("Ignoring {}: {}", file, e));
            }
        }
    }
    warnings
}

/// Loads the configuration from the default file and `ORION_` environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing the server and messenger configurations
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("ORION")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.origins")
                .with_list_parse_key("messenger.heartbeat")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();
    let server = partial.server;
    let messenger = partial.messenger;

    Ok(Settings {
        server: ServerSettings {
            host: server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
            debug: server
                .as_ref()
                .and_then(|s| s.debug)
                .unwrap_or(default.server.debug),
            log_level: server
                .as_ref()
                .and_then(|s| s.log_level.clone())
                .unwrap_or(default.server.log_level),
            origins: server
                .as_ref()
                .and_then(|s| s.origins.clone())
                .unwrap_or(default.server.origins),
        },
        messenger: MessengerSettings {
            host: messenger
                .as_ref()
                .and_then(|m| m.host.clone())
                .unwrap_or(default.messenger.host),
            port: messenger
                .as_ref()
                .and_then(|m| m.port)
                .unwrap_or(default.messenger.port),
            connection_timeout_ms: messenger
                .as_ref()
                .and_then(|m| m.connection_timeout_ms)
                .unwrap_or(default.messenger.connection_timeout_ms),
            heartbeat: messenger
                .as_ref()
                .and_then(|m| m.heartbeat)
                .map(|[send, receive]| (send, receive))
                .unwrap_or(default.messenger.heartbeat),
            username: messenger
                .as_ref()
                .and_then(|m| m.username.clone())
                .or(default.messenger.username),
            password: messenger
                .as_ref()
                .and_then(|m| m.password.clone())
                .or(default.messenger.password),
            client_id: messenger
                .as_ref()
                .and_then(|m| m.client_id.clone())
                .unwrap_or(default.messenger.client_id),
            default_destination: messenger
                .as_ref()
                .and_then(|m| m.default_destination.clone())
                .unwrap_or(default.messenger.default_destination),
        },
    })
}

#[cfg(test)]
mod tests;
