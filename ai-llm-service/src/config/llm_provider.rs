use std::{fmt, str::FromStr};

use crate::error_handler::ConfigError;

/// Represents the backend that serves the causal language model.
///
/// - [`LlmProvider::Ollama`] is the local runtime holding a downloaded checkpoint.
/// - [`LlmProvider::OpenAI`] is any remote OpenAI-compatible inference API.
///
/// # Examples
///
/// ```
/// use ai_llm_service::LlmProvider;
///
/// let p: LlmProvider = "ollama".parse().unwrap();
/// assert_eq!(p, LlmProvider::Ollama);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI-compatible remote inference API.
    OpenAI,
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    /// Parses `LLM_KIND` values. Accepts `ollama`, `local`, `openai`, `chatgpt`, `remote`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" | "local" => Ok(LlmProvider::Ollama),
            "openai" | "chatgpt" | "remote" => Ok(LlmProvider::OpenAI),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Ollama => f.write_str("Ollama"),
            LlmProvider::OpenAI => f.write_str("OpenAI"),
        }
    }
}
