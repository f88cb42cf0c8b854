//! Typed error for the chat-core crate.

use ai_llm_service::AiLlmError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ChatError {
    /// The message box was empty or whitespace only.
    #[error("message must not be empty")]
    EmptyMessage,

    /// Retry was requested on a conversation without exchanges.
    #[error("there is no previous message to retry")]
    NothingToRetry,

    /// No session with this id (never created, removed or evicted).
    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    /// The session was edited while a reply was being generated.
    #[error("session {0} changed while the reply was generated")]
    SessionChanged(Uuid),

    /// Invalid parameters, provider or transport failures from the LLM client.
    #[error(transparent)]
    Llm(#[from] AiLlmError),
}

impl ChatError {
    /// Whether the failure came from the caller's input rather than the backend.
    pub fn is_client_error(&self) -> bool {
        match self {
            ChatError::EmptyMessage
            | ChatError::NothingToRetry
            | ChatError::SessionNotFound(_)
            | ChatError::SessionChanged(_) => true,
            ChatError::Llm(AiLlmError::Config(_)) => true,
            ChatError::Llm(_) => false,
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
