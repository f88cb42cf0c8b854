use chat_core::ChatHistory;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::chat::chat_request::TurnSettings;

/// Request payload for `POST /api/sessions/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct SessionMessageRequest {
    pub message: String,
    #[serde(flatten)]
    pub settings: TurnSettings,
}

/// Session id with its current conversation.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub history: ChatHistory,
}

/// Reply produced inside a session.
#[derive(Debug, Serialize)]
pub struct SessionReplyResponse {
    pub session_id: Uuid,
    pub reply: String,
    pub history: ChatHistory,
    pub failed: bool,
}
