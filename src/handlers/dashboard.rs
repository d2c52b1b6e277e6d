use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Router};

use super::common::success_response;
use crate::{errors::ApiError, AppState};

async fn dashboard(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let report = state.services.analytics.dashboard().await?;
    Ok(success_response(report))
}

pub fn dashboard_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(dashboard))
}
