//! HTTP API
//!
//! Every endpoint module exposes a `router()`; `routers()` is the registry the
//! application is assembled from. Add new endpoint modules to that list.

pub mod pipeline;

use axum::Router;
use axum::http::HeaderValue;
use axum::response::Json;
use axum::routing::get;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerSettings;
use crate::messaging::Dispatcher;
use crate::transport::Connector;

/// Shared state accessible from Axum handlers.
pub struct AppState<C: Connector> {
    pub dispatcher: Dispatcher<C>,
}

impl<C: Connector> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<C: Connector> AppState<C> {
    pub fn new(dispatcher: Dispatcher<C>) -> Self {
        Self { dispatcher }
    }
}

#[derive(Debug, Serialize)]
struct Metadata {
    version: &'static str,
}

/// Serves metadata about the running server.
async fn metadata() -> Json<Metadata> {
    Json(Metadata {
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Routers of every endpoint module.
pub fn routers<C: Connector>() -> Vec<Router<AppState<C>>> {
    vec![pipeline::router()]
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Builds the application router with all registered endpoints.
pub fn app<C: Connector>(state: AppState<C>, settings: &ServerSettings) -> Router {
    let mut router = Router::new().route("/meta", get(metadata));
    for endpoint in routers::<C>() {
        router = router.merge(endpoint);
    }
    router
        .layer(cors_layer(&settings.origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until the server fails.
pub async fn serve<C: Connector>(
    state: AppState<C>,
    settings: &ServerSettings,
) -> std::io::Result<()> {
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on http://{}", addr);
    axum::serve(listener, app(state, settings)).await
}
