use crate::config::{generation_params::GenerationParams, llm_provider::LlmProvider};

/// Configuration for the model behind the chat.
///
/// Sampling fields hold the defaults applied when a request does not override
/// them (see [`LlmModelConfig::default_params`]).
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Ollama,
///     model: "gpt2".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     api_key: None,
///     max_tokens: Some(200),
///     temperature: Some(0.7),
///     top_p: Some(0.95),
///     top_k: Some(50),
///     timeout_secs: Some(120),
/// };
/// assert_eq!(cfg.default_params().max_new_tokens, 200);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The backend serving the model.
    pub provider: LlmProvider,

    /// Model identifier (e.g., `"gpt2"`, `"llama3.2:3b"`).
    pub model: String,

    /// Base URL of the inference endpoint.
    pub endpoint: String,

    /// Optional API key for authenticated providers.
    pub api_key: Option<String>,

    /// Default number of new tokens to generate.
    pub max_tokens: Option<u32>,

    /// Default sampling temperature.
    pub temperature: Option<f32>,

    /// Default nucleus sampling cutoff.
    pub top_p: Option<f32>,

    /// Default top-k cutoff (ignored by providers that do not support it).
    pub top_k: Option<u32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Generation parameters derived from this config, falling back to
    /// [`GenerationParams::default`] for unset fields.
    pub fn default_params(&self) -> GenerationParams {
        let base = GenerationParams::default();
        GenerationParams {
            max_new_tokens: self.max_tokens.unwrap_or(base.max_new_tokens),
            temperature: self.temperature.unwrap_or(base.temperature),
            top_p: self.top_p.unwrap_or(base.top_p),
            top_k: self.top_k.or(base.top_k),
            stop: base.stop,
        }
    }
}
