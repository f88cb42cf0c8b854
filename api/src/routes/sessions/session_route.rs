//! Server-side conversations: `/api/sessions/...`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use chat_core::{ChatError, Exchange};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::{
        chat::chat_request::TurnSettings,
        request_id,
        sessions::session_request::{
            SessionMessageRequest, SessionReplyResponse, SessionResponse,
        },
    },
};

/// Handler: POST /api/sessions
pub async fn create_session_route(State(state): State<Arc<AppState>>) -> Response {
    let session_id = state.sessions.create().await;
    info!(session = %session_id, "session created");
    ApiResponse::success(SessionResponse {
        session_id,
        history: Default::default(),
    })
    .into_response_with_status(StatusCode::CREATED)
}

/// Handler: POST /api/sessions/{id}/messages
pub async fn session_message_route(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<SessionMessageRequest>,
) -> AppResult<ApiResponse<SessionReplyResponse>> {
    debug!(request_id = %request_id(&headers), session = %session_id, "session_message_route: start");

    let (history, revision) = state.sessions.snapshot(session_id).await?;
    let opts = state.turn_options(body.settings);
    let reply = state
        .bot
        .reply(history.exchanges(), &body.message, &opts)
        .await?;

    // Rejected with SESSION_CHANGED when the session was edited meanwhile.
    let history = if reply.failed {
        history
    } else {
        state
            .sessions
            .record(
                session_id,
                revision,
                Exchange::new(body.message.trim(), reply.text.as_str()),
            )
            .await?
    };

    Ok(ApiResponse::success(SessionReplyResponse {
        session_id,
        reply: reply.text,
        history,
        failed: reply.failed,
    }))
}

/// Handler: POST /api/sessions/{id}/retry
///
/// Regenerates the reply to the latest user message. Body: the same
/// settings as a message (`{}` for defaults). Answers 409 when the session
/// was edited before the new reply was ready.
pub async fn retry_session_route(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    headers: HeaderMap,
    Json(settings): Json<TurnSettings>,
) -> AppResult<ApiResponse<SessionReplyResponse>> {
    debug!(request_id = %request_id(&headers), session = %session_id, "retry_session_route: start");

    let (history, revision) = state.sessions.snapshot(session_id).await?;
    let (last, earlier) = history
        .exchanges()
        .split_last()
        .ok_or(ChatError::NothingToRetry)?;

    let opts = state.turn_options(settings);
    let reply = state.bot.reply(earlier, &last.user, &opts).await?;

    let history = if reply.failed {
        history.clone()
    } else {
        state
            .sessions
            .replace_last(
                session_id,
                revision,
                Exchange::new(last.user.as_str(), reply.text.as_str()),
            )
            .await?
    };

    Ok(ApiResponse::success(SessionReplyResponse {
        session_id,
        reply: reply.text,
        history,
        failed: reply.failed,
    }))
}

/// Handler: POST /api/sessions/{id}/undo
pub async fn undo_session_route(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let history = state.sessions.undo(session_id).await?;
    Ok(ApiResponse::success(SessionResponse {
        session_id,
        history,
    }))
}

/// Handler: POST /api/sessions/{id}/clear
pub async fn clear_session_route(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> AppResult<ApiResponse<SessionResponse>> {
    state.sessions.clear(session_id).await?;
    Ok(ApiResponse::success(SessionResponse {
        session_id,
        history: Default::default(),
    }))
}

/// Handler: DELETE /api/sessions/{id}
pub async fn delete_session_route(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.sessions.remove(session_id).await?;
    info!(session = %session_id, "session removed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::response::IntoResponse;

    use super::*;
    use crate::{
        core::app_state::tests::{mock_ollama, offline_state, state_for},
        error_handler::AppError,
    };

    #[tokio::test]
    async fn session_lifecycle_without_backend() {
        let state = offline_state();
        let res = create_session_route(State(state.clone())).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(state.sessions.len().await, 1);

        let id = state.sessions.create().await;
        state
            .sessions
            .record(id, 0, Exchange::new("Habari?", "Nzuri"))
            .await
            .unwrap();

        let undone = undo_session_route(State(state.clone()), Path(id)).await.unwrap();
        assert!(undone.data.unwrap().history.is_empty());

        let cleared = clear_session_route(State(state.clone()), Path(id)).await.unwrap();
        assert!(cleared.data.unwrap().history.is_empty());

        let status = delete_session_route(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let gone = delete_session_route(State(state), Path(id)).await.unwrap_err();
        assert_eq!(gone.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_message_and_empty_retry_are_bad_requests() {
        let state = offline_state();
        let id = state.sessions.create().await;

        let err = session_message_route(
            State(state.clone()),
            Path(id),
            HeaderMap::new(),
            Json(SessionMessageRequest {
                message: "   ".into(),
                settings: TurnSettings::default(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = retry_session_route(
            State(state),
            Path(id),
            HeaderMap::new(),
            Json(TurnSettings::default()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Chat(ChatError::NothingToRetry)));
    }

    #[tokio::test]
    async fn unreachable_backend_yields_failed_reply_and_keeps_history() {
        let state = offline_state();
        let id = state.sessions.create().await;

        let resp = session_message_route(
            State(state.clone()),
            Path(id),
            HeaderMap::new(),
            Json(SessionMessageRequest {
                message: "Habari?".into(),
                settings: TurnSettings::default(),
            }),
        )
        .await
        .unwrap();
        let data = resp.data.unwrap();
        assert!(data.failed);
        assert!(data.reply.starts_with("❌ "));
        assert!(data.history.is_empty());
        assert!(state.sessions.history(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retry_overlapped_by_new_message_keeps_both_exchanges() {
        let state = state_for(mock_ollama(" regenerated", Duration::from_millis(300)).await);
        let id = state.sessions.create().await;
        state
            .sessions
            .record(id, 0, Exchange::new("A", "a"))
            .await
            .unwrap();

        let retry = tokio::spawn(retry_session_route(
            State(state.clone()),
            Path(id),
            HeaderMap::new(),
            Json(TurnSettings::default()),
        ));
        tokio::time::sleep(Duration::from_millis(100)).await;
        let (_, rev) = state.sessions.snapshot(id).await.unwrap();
        state
            .sessions
            .record(id, rev, Exchange::new("B", "b"))
            .await
            .unwrap();

        let err = retry.await.unwrap().unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(
            state.sessions.history(id).await.unwrap().exchanges(),
            &[Exchange::new("A", "a"), Exchange::new("B", "b")]
        );
    }

    #[tokio::test]
    async fn message_overlapped_by_clear_leaves_session_empty() {
        let state = state_for(mock_ollama(" regenerated", Duration::from_millis(300)).await);
        let id = state.sessions.create().await;

        let turn = tokio::spawn(session_message_route(
            State(state.clone()),
            Path(id),
            HeaderMap::new(),
            Json(SessionMessageRequest {
                message: "hi".into(),
                settings: TurnSettings::default(),
            }),
        ));
        tokio::time::sleep(Duration::from_millis(100)).await;
        state.sessions.clear(id).await.unwrap();

        let err = turn.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::Chat(ChatError::SessionChanged(s)) if s == id));
        assert!(state.sessions.history(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn message_and_retry_record_replies() {
        let state = state_for(mock_ollama(" Nzuri sana", Duration::ZERO).await);
        let id = state.sessions.create().await;

        let resp = session_message_route(
            State(state.clone()),
            Path(id),
            HeaderMap::new(),
            Json(SessionMessageRequest {
                message: "Habari?".into(),
                settings: TurnSettings::default(),
            }),
        )
        .await
        .unwrap();
        let data = resp.data.unwrap();
        assert!(!data.failed);
        assert_eq!(data.history.exchanges(), &[Exchange::new("Habari?", "Nzuri sana")]);

        let resp = retry_session_route(
            State(state.clone()),
            Path(id),
            HeaderMap::new(),
            Json(TurnSettings::default()),
        )
        .await
        .unwrap();
        assert_eq!(resp.data.unwrap().history.len(), 1);
        assert_eq!(state.sessions.history(id).await.unwrap().len(), 1);
    }
}
