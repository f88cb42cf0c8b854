//! Provider-agnostic generation client.
//!
//! - Construct once from an [`LlmModelConfig`], wrap in `Arc`, and share.
//! - [`TextGenerator`] is what the chat layer depends on, so tests can swap
//!   the network for a canned generator.
//!
//! # Example
//! ```no_run
//! use ai_llm_service::{GenerationParams, LlmClient, TextGenerator};
//! use ai_llm_service::config::default_config::config_from_env;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LlmClient::new(config_from_env()?)?;
//!     let text = client
//!         .generate("User: Habari?\nBot:", &GenerationParams::default())
//!         .await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

use std::future::Future;

use crate::{
    config::{
        generation_params::GenerationParams, llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::Result,
    health_service::{HealthService, HealthStatus},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Anything that turns a prompt into generated text.
pub trait TextGenerator: Send + Sync {
    /// Generates a continuation of `prompt` in one call.
    fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Generates a continuation, handing each fragment to `on_token` as it
    /// arrives. Returns the full text.
    fn generate_stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug)]
enum Backend {
    Ollama(OllamaService),
    OpenAI(OpenAiService),
}

/// Generation client bound to a single model config.
#[derive(Debug)]
pub struct LlmClient {
    backend: Backend,
    health: HealthService,
}

impl LlmClient {
    /// Builds the provider client selected by `cfg.provider`.
    ///
    /// # Errors
    /// Propagates provider construction errors (bad endpoint, missing key,
    /// HTTP client build failure).
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let health = HealthService::new(Some(10))?;
        let backend = match cfg.provider {
            LlmProvider::Ollama => Backend::Ollama(OllamaService::new(cfg)?),
            LlmProvider::OpenAI => Backend::OpenAI(OpenAiService::new(cfg)?),
        };
        Ok(Self { backend, health })
    }

    /// Model config in use.
    pub fn config(&self) -> &LlmModelConfig {
        match &self.backend {
            Backend::Ollama(s) => s.config(),
            Backend::OpenAI(s) => s.config(),
        }
    }

    /// Probes the backend. Never fails; problems show up as `ok = false`.
    pub async fn health(&self) -> HealthStatus {
        self.health.check(self.config()).await
    }
}

impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        match &self.backend {
            Backend::Ollama(s) => s.generate(prompt, params).await,
            Backend::OpenAI(s) => s.generate(prompt, params).await,
        }
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> Result<String> {
        match &self.backend {
            Backend::Ollama(s) => s.generate_stream(prompt, params, on_token).await,
            Backend::OpenAI(s) => s.generate_stream(prompt, params, on_token).await,
        }
    }
}
