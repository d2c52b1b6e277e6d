use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tracing::error;

use crate::{db, AppState};

/// Liveness and database reachability in one probe.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match db::check_connection(&state.db).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded" })),
            )
        }
    }
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(health_check))
}
