//! POST /api/chat: one stateless chat turn.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use tracing::debug;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::{
        chat::chat_request::{ChatRequest, ChatResponse},
        request_id,
    },
};

/// Handler: POST /api/chat
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:7860/api/chat \
///   -H 'content-type: application/json' \
///   -d '{"message":"Habari yako?","history":[],"max_tokens":200,"temperature":0.7,"top_p":0.95,"language":"Kiswahili"}'
/// ```
pub async fn chat_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> AppResult<ApiResponse<ChatResponse>> {
    let request_id = request_id(&headers);
    debug!(
        request_id = %request_id,
        history = body.history.len(),
        "chat_route: start"
    );

    let ChatRequest {
        message,
        history,
        settings,
    } = body;
    let opts = state.turn_options(settings);
    let reply = state
        .bot
        .reply(history.exchanges(), &message, &opts)
        .await?;

    debug!(request_id = %request_id, failed = reply.failed, "chat_route: done");
    Ok(ApiResponse::success(ChatResponse::new(history, &message, reply)))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{http::StatusCode, response::IntoResponse};
    use chat_core::{ChatHistory, Exchange};

    use super::*;
    use crate::{
        core::app_state::tests::{mock_ollama, offline_state, state_for},
        routes::chat::chat_request::TurnSettings,
    };

    fn request(message: &str, history: ChatHistory) -> Json<ChatRequest> {
        Json(ChatRequest {
            message: message.into(),
            history,
            settings: TurnSettings::default(),
        })
    }

    #[tokio::test]
    async fn unreachable_backend_returns_failed_reply_and_same_history() {
        let prior = ChatHistory::from(vec![Exchange::new("A", "a")]);
        let resp = chat_route(State(offline_state()), HeaderMap::new(), request("Habari?", prior.clone()))
            .await
            .unwrap();

        let data = resp.data.unwrap();
        assert!(data.failed);
        assert!(data.reply.starts_with("❌ "));
        assert_eq!(data.history, prior);
    }

    #[tokio::test]
    async fn reply_is_appended_to_the_sent_history() {
        let state = state_for(mock_ollama(" Nzuri sana", Duration::ZERO).await);
        let prior = ChatHistory::from(vec![Exchange::new("A", "a")]);
        let resp = chat_route(State(state), HeaderMap::new(), request(" Habari? ", prior))
            .await
            .unwrap();

        let data = resp.data.unwrap();
        assert!(!data.failed);
        assert_eq!(data.reply, "Nzuri sana");
        assert_eq!(
            data.history.exchanges(),
            &[Exchange::new("A", "a"), Exchange::new("Habari?", "Nzuri sana")]
        );
    }

    #[tokio::test]
    async fn blank_message_is_a_bad_request() {
        let err = chat_route(State(offline_state()), HeaderMap::new(), request(" ", ChatHistory::new()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
