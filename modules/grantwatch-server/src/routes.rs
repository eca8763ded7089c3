use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::error;

use grantwatch_harvest::harvester::Harvester;

#[derive(Clone)]
pub struct AppState {
    pub harvester: Arc<Harvester>,
    /// Serializes harvest runs. A manual trigger arriving while the
    /// scheduled run is in flight waits for it rather than racing it.
    pub run_lock: Arc<tokio::sync::Mutex<()>>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/harvest", post(trigger_harvest))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn trigger_harvest(State(state): State<AppState>) -> Response {
    let _guard = state.run_lock.lock().await;

    match state.harvester.run().await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Harvest run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("harvest failed: {e:#}"),
            )
                .into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}
