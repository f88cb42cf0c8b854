//! POST /api/chat/stream: a stateless chat turn as server-sent events.
//!
//! Events:
//! - `token`: `{"text": "..."}` for each raw fragment from the backend
//! - `done`:  the same payload as `/api/chat` (cleaned reply and history)
//! - `error`: `{"code": "...", "message": "..."}` when the turn was rejected

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use crate::{
    core::app_state::AppState,
    routes::{
        chat::chat_request::{ChatRequest, ChatResponse},
        request_id,
    },
};

#[derive(Debug)]
enum StreamMsg {
    Token(String),
    Done(ChatResponse),
    Error { code: &'static str, message: String },
}

impl StreamMsg {
    fn into_event(self) -> Event {
        let event = match self {
            StreamMsg::Token(text) => Event::default().event("token").json_data(json!({ "text": text })),
            StreamMsg::Done(resp) => Event::default().event("done").json_data(resp),
            StreamMsg::Error { code, message } => Event::default()
                .event("error")
                .json_data(json!({ "code": code, "message": message })),
        };
        event.unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
    }
}

/// Handler: POST /api/chat/stream
pub async fn chat_stream_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let request_id = request_id(&headers).to_string();
    debug!(request_id = %request_id, history = body.history.len(), "chat_stream_route: start");

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let ChatRequest {
            message,
            history,
            settings,
        } = body;
        let opts = state.turn_options(settings);

        let token_tx = tx.clone();
        let mut on_token = move |t: &str| {
            let _ = token_tx.send(StreamMsg::Token(t.to_string()));
        };
        let turn = state
            .bot
            .reply_stream(history.exchanges(), &message, &opts, &mut on_token);
        let result = tokio::select! {
            result = turn => result,
            _ = tx.closed() => {
                debug!(request_id = %request_id, "chat_stream_route: client disconnected, turn dropped");
                return;
            }
        };

        let last = match result {
            Ok(reply) => {
                debug!(request_id = %request_id, failed = reply.failed, "chat_stream_route: done");
                StreamMsg::Done(ChatResponse::new(history, &message, reply))
            }
            Err(err) => {
                warn!(request_id = %request_id, error = %err, "chat_stream_route: rejected");
                StreamMsg::Error {
                    code: "BAD_REQUEST",
                    message: err.to_string(),
                }
            }
        };
        let _ = tx.send(last);
    });

    let stream = UnboundedReceiverStream::new(rx).map(|msg| Ok(msg.into_event()));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}


#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, response::IntoResponse};
    use chat_core::{ChatHistory, Exchange};
    use serde_json::Value;

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

    /// `(event, data)` pairs of a finished SSE body.
    async fn collect_events(state: Arc<AppState>, req: Json<ChatRequest>) -> Vec<(String, Value)> {
        let resp = chat_stream_route(State(state), HeaderMap::new(), req)
            .await
            .into_response();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        text.split("\n\n")
            .filter_map(|frame| {
                let mut event = None;
                let mut data: Option<Value> = None;
                for line in frame.lines() {
                    if let Some(v) = line.strip_prefix("event:") {
                        event = Some(v.trim().to_string());
                    } else if let Some(v) = line.strip_prefix("data:") {
                        data = Some(serde_json::from_str(v.trim()).unwrap());
                    }
                }
                Some((event?, data?))
            })
            .collect()
    }

    #[tokio::test]
    async fn tokens_arrive_before_done() {
        let state = state_for(mock_ollama(" Nzuri sana", Duration::ZERO).await);
        let prior = ChatHistory::from(vec![Exchange::new("A", "a")]);
        let events = collect_events(state, request("Habari?", prior)).await;

        let (last, tokens) = events.split_last().unwrap();
        assert!(!tokens.is_empty());
        assert!(tokens.iter().all(|(name, _)| name == "token"));
        let streamed: String = tokens
            .iter()
            .map(|(_, data)| data["text"].as_str().unwrap())
            .collect();
        assert_eq!(streamed, " Nzuri sana");

        assert_eq!(last.0, "done");
        assert_eq!(last.1["failed"], false);
        assert_eq!(last.1["reply"], "Nzuri sana");
        assert_eq!(last.1["history"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_message_yields_only_an_error_event() {
        let events = collect_events(offline_state(), request("  ", ChatHistory::new())).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "error");
        assert_eq!(events[0].1["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unreachable_backend_ends_with_failed_done() {
        let events = collect_events(offline_state(), request("Habari?", ChatHistory::new())).await;
        let (name, data) = events.last().unwrap();
        assert_eq!(name, "done");
        assert_eq!(data["failed"], true);
        assert!(data["reply"].as_str().unwrap().starts_with("❌ "));
        assert!(data["history"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn disconnect_stops_the_turn() {
        let state = state_for(mock_ollama(" polepole", Duration::from_secs(5)).await);
        let resp = chat_stream_route(
            State(state.clone()),
            HeaderMap::new(),
            request("Habari?", ChatHistory::new()),
        )
        .await
        .into_response();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(Arc::strong_count(&state), 2);

        drop(resp);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(Arc::strong_count(&state), 1);
    }
}
