//! Text generation client shared by the chat service and the terminal bot.
//!
//! The crate talks to a causal language model served either by a local
//! Ollama runtime or by a remote OpenAI-compatible API. It never tokenizes or
//! samples on its own: prompts go out as plain text, generated text comes back.
//!
//! Entry points:
//! - [`config::default_config::config_from_env`] builds an [`LlmModelConfig`]
//! - [`LlmClient`] dispatches generation to the configured provider
//! - [`TextGenerator`] is the seam the chat layer depends on
//! - [`health_service::HealthService`] probes the backend for `/health`

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod llm_client;
pub mod services;
pub mod telemetry;

pub use config::generation_params::GenerationParams;
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, Result};
pub use llm_client::{LlmClient, TextGenerator};
