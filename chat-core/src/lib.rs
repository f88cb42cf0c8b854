//! Chat layer on top of `ai-llm-service`.
//!
//! Turns a conversation (history of user/bot exchanges) into a prompt for a
//! causal language model and cleans the generated continuation into a reply.
//! Shared by the HTTP API and the terminal chat.

pub mod bot;
pub mod config;
pub mod error;
pub mod history;
pub mod i18n;
pub mod prompt;
pub mod session_store;
pub mod terminal;

pub use bot::{ChatBot, Reply, TurnOptions, render_failure};
pub use config::ChatConfig;
pub use error::{ChatError, ChatResult};
pub use history::{ChatHistory, DEFAULT_HISTORY_WINDOW, Exchange};
pub use i18n::{Language, LocalizedTexts, text};
pub use prompt::PromptFormat;
pub use session_store::SessionStore;
pub use terminal::{ChatSession, is_exit_word};
