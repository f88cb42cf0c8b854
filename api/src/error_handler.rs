use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ai_llm_service::AiLlmError;
use chat_core::ChatError;
use thiserror::Error;
use tracing::error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    // --- IO / network / server ---
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Chat(ChatError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Chat(ChatError::SessionChanged(_)) => StatusCode::CONFLICT,
            AppError::Chat(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Chat(_) => StatusCode::BAD_GATEWAY,

            AppError::Llm(AiLlmError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::Llm(_) => StatusCode::BAD_GATEWAY,

            AppError::Bind { .. } | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Chat(ChatError::EmptyMessage) => "EMPTY_MESSAGE",
            AppError::Chat(ChatError::NothingToRetry) => "NOTHING_TO_RETRY",
            AppError::Chat(ChatError::SessionNotFound(_)) => "SESSION_NOT_FOUND",
            AppError::Chat(ChatError::SessionChanged(_)) => "SESSION_CHANGED",
            AppError::Chat(ChatError::Llm(AiLlmError::Config(_))) => "INVALID_PARAMS",
            AppError::Chat(ChatError::Llm(_)) => "LLM_ERROR",
            AppError::Llm(AiLlmError::Config(_)) => "CONFIG_ERROR",
            AppError::Llm(_) => "LLM_ERROR",
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        }
        ApiResponse::<()>::error(self.error_code(), self.to_string(), Vec::new())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;
