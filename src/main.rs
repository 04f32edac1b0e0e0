use std::process::ExitCode;
use std::sync::Arc;

use orion::config::{Settings, load_config, load_env_files};
use orion::messaging::Dispatcher;
use orion::server::{AppState, serve};
use orion::utils::logging;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let env_warnings = load_env_files();

    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            for warning in &env_warnings {
                warn!("{}", warning);
            }
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(settings.server.effective_log_level());
    for warning in &env_warnings {
        warn!("{}", warning);
    }

    match run_server(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = Dispatcher::new(Arc::new(settings.messenger.clone()));
    info!(
        "Publishing events to {} at {}",
        dispatcher.default_destination(),
        settings.messenger.address()
    );

    tokio::select! {
        result = serve(AppState::new(dispatcher), &settings.server) => {
            result?;
            error!("HTTP server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}
