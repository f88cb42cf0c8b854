//! HTTP surface of the chat: the web UI plus its JSON/SSE API.

use std::{env, sync::Arc};

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tokio::signal;
use tracing::{info, warn};

use crate::{
    core::app_state::AppState,
    error_handler::AppError,
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        chat::{chat_route::chat_route, chat_stream_route::chat_stream_route},
        health::health_route::health_route,
        sessions::session_route::{
            clear_session_route, create_session_route, delete_session_route,
            retry_session_route, session_message_route, undo_session_route,
        },
        settings::{settings_route::settings_route, texts_route::texts_route},
        ui::ui_route::ui_route,
    },
};

/// Listen address when `API_ADDRESS` is unset.
pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:7860";

/// Builds the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(ui_route))
        .route("/health", get(health_route))
        .route("/api/texts/{language}", get(texts_route))
        .route("/api/settings", get(settings_route))
        .route("/api/chat", post(chat_route))
        .route("/api/chat/stream", post(chat_stream_route))
        .route("/api/sessions", post(create_session_route))
        .route("/api/sessions/{id}", delete(delete_session_route))
        .route("/api/sessions/{id}/messages", post(session_message_route))
        .route("/api/sessions/{id}/retry", post(retry_session_route))
        .route("/api/sessions/{id}/undo", post(undo_session_route))
        .route("/api/sessions/{id}/clear", post(clear_session_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Reads config from the environment and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let addr = env::var("API_ADDRESS")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string());

    let state = Arc::new(AppState::from_env()?);
    let health = state.bot.generator().health().await;
    if health.ok {
        info!(latency_ms = health.latency_ms, "{}", health.message);
    } else {
        warn!(message = %health.message, "backend not ready, serving anyway");
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, "chat server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("chat server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
