//! Pipeline endpoints.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::info;
use uuid::Uuid;

use crate::server::AppState;
use crate::transport::Connector;

/// Event queued for the processing pipeline.
#[derive(Debug, Serialize)]
pub struct IngestEvent {
    pub batch_id: String,
    /// RFC 3339, UTC.
    pub received_at: String,
    pub data: Map<String, Value>,
}

pub fn router<C: Connector>() -> Router<AppState<C>> {
    Router::new().route("/pipeline/ingest", post(ingest::<C>))
}

/// Accepts a JSON form and queues it for processing.
///
/// Responds with the id of the processing batch, or 503 when the event
/// could not be handed to the broker.
async fn ingest<C: Connector>(
    State(state): State<AppState<C>>,
    Json(data): Json<Map<String, Value>>,
) -> Response {
    let event = IngestEvent {
        batch_id: Uuid::new_v4().to_string(),
        received_at: Utc::now().to_rfc3339(),
        data,
    };

    if state.dispatcher.dispatch(&event, None, None).await {
        info!("Queued batch {}", event.batch_id);
        (StatusCode::OK, Json(json!({ "batch_id": event.batch_id }))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": format!("could not queue batch {}", event.batch_id),
            })),
        )
            .into_response()
    }
}
