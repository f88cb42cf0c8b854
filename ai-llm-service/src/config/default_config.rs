//! Model config loaded from environment variables.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`         = provider kind (`ollama` default, or `openai`)
//! - `LLM_MAX_TOKENS`   = optional default max new tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional request timeout (u64, default 120)
//!
//! Ollama:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (default `http://localhost:11434`)
//! - `OLLAMA_MODEL`                = model name (mandatory)
//!
//! OpenAI-compatible:
//! - `OPENAI_URL`     = base URL (default `https://api.openai.com`)
//! - `OPENAI_API_KEY` = bearer token (mandatory)
//! - `OPENAI_MODEL`   = model name (mandatory)

use crate::{
    config::{
        generation_params::MAX_NEW_TOKENS_LIMIT, llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::{ConfigError, Result, parse_opt_number, validate_http_endpoint},
};

const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Builds the model config from the process environment.
///
/// # Errors
/// See [`config_from_lookup`].
pub fn config_from_env() -> Result<LlmModelConfig> {
    config_from_lookup(|name| std::env::var(name).ok())
}

/// Builds the model config from an arbitrary variable source.
///
/// Empty values count as unset.
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_KIND`
/// - [`ConfigError::MissingVar`] when a mandatory variable is absent
/// - [`ConfigError::InvalidNumber`] for malformed numeric variables
/// - [`ConfigError::OutOfRange`] when `LLM_MAX_TOKENS` is outside `1..=4096`
/// - [`ConfigError::InvalidFormat`] when the endpoint is not http(s)
pub fn config_from_lookup<F>(lookup: F) -> Result<LlmModelConfig>
where
    F: Fn(&'static str) -> Option<String>,
{
    let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());

    let provider = match get("LLM_KIND") {
        Some(kind) => kind.parse::<LlmProvider>()?,
        None => LlmProvider::Ollama,
    };

    let max_tokens = parse_opt_number::<u32>(get("LLM_MAX_TOKENS"), "LLM_MAX_TOKENS", "expected u32")?;
    if max_tokens.is_some_and(|n| !(1..=MAX_NEW_TOKENS_LIMIT).contains(&n)) {
        return Err(ConfigError::OutOfRange {
            field: "LLM_MAX_TOKENS",
            detail: "expected 1..=4096",
        }
        .into());
    }
    let timeout_secs =
        parse_opt_number::<u64>(get("LLM_TIMEOUT_SECS"), "LLM_TIMEOUT_SECS", "expected u64")?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let (endpoint, endpoint_var, model, api_key) = match provider {
        LlmProvider::Ollama => {
            let (endpoint, var) = ollama_endpoint(&get)?;
            let model = get("OLLAMA_MODEL").ok_or(ConfigError::MissingVar("OLLAMA_MODEL"))?;
            (endpoint, var, model, None)
        }
        LlmProvider::OpenAI => {
            let endpoint =
                get("OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_ENDPOINT.to_string());
            let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::MissingVar("OPENAI_API_KEY"))?;
            let model = get("OPENAI_MODEL").ok_or(ConfigError::MissingVar("OPENAI_MODEL"))?;
            (endpoint, "OPENAI_URL", model, Some(api_key))
        }
    };
    validate_http_endpoint(endpoint_var, &endpoint)?;

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature: Some(0.7),
        top_p: Some(0.95),
        top_k: Some(50),
        timeout_secs: Some(timeout_secs),
    })
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL`
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. `http://localhost:11434`
fn ollama_endpoint<G>(get: &G) -> Result<(String, &'static str)>
where
    G: Fn(&'static str) -> Option<String>,
{
    if let Some(url) = get("OLLAMA_URL") {
        return Ok((url.trim().to_string(), "OLLAMA_URL"));
    }
    if let Some(port) = get("OLLAMA_PORT") {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok((format!("http://localhost:{port}"), "OLLAMA_PORT"));
    }
    Ok((DEFAULT_OLLAMA_ENDPOINT.to_string(), "OLLAMA_URL"))
}
