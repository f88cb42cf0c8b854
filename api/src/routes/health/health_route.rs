use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use tracing::warn;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

/// Handler: GET /health
///
/// 200 with the backend status when the model is reachable, 503 otherwise.
pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let status = state.bot.generator().health().await;
    let code = if status.ok {
        StatusCode::OK
    } else {
        warn!(message = %status.message, "backend unhealthy");
        StatusCode::SERVICE_UNAVAILABLE
    };
    ApiResponse::success(status).into_response_with_status(code)
}
