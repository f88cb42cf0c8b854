//! Health probes for the generation backend.
//!
//! - Ollama: `GET {endpoint}/api/tags`, the model must be pulled locally
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth, the model must be listed
//!
//! [`HealthService::check`] never fails: any error becomes `ok = false`, which
//! is what the `/health` route wants to render.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// Serializable health snapshot of the configured backend.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend name ("Ollama" or "OpenAI").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model the chat is configured to use.
    pub model: String,
    /// Overall health flag.
    pub ok: bool,
    /// Latency of the probe in milliseconds.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: cfg.provider.to_string(),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker that reuses a single HTTP client.
#[derive(Debug)]
pub struct HealthService {
    client: reqwest::Client,
    timeout: Duration,
}

impl HealthService {
    /// Creates a health service with an optional probe timeout (seconds, default 10).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    /// Probes the backend described by `cfg`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let endpoint = cfg.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            warn!(provider = %cfg.provider, endpoint = %cfg.endpoint, "invalid endpoint");
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let started = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.probe_ollama(cfg).await,
            LlmProvider::OpenAI => self.probe_openai(cfg).await,
        };
        let latency = started.elapsed().as_millis();

        let status = match result {
            Ok(ModelPresence::Listed) => HealthStatus::new(
                cfg,
                true,
                latency,
                format!("{} is healthy; model is available", cfg.provider),
            ),
            Ok(ModelPresence::Missing) => HealthStatus::new(
                cfg,
                false,
                latency,
                format!("{} is up, but model `{}` is not available", cfg.provider, cfg.model),
            ),
            Ok(ModelPresence::Unknown(reason)) => HealthStatus::new(
                cfg,
                true,
                latency,
                format!("{} is reachable; {reason}", cfg.provider),
            ),
            Err(err) => HealthStatus::new(cfg, false, latency, err.to_string()),
        };

        if status.ok {
            info!(
                provider = %status.provider,
                model = %status.model,
                latency_ms = status.latency_ms,
                "health probe completed"
            );
        } else {
            warn!(
                provider = %status.provider,
                model = %status.model,
                latency_ms = status.latency_ms,
                message = %status.message,
                "health probe failed"
            );
        }
        status
    }

    async fn probe_ollama(&self, cfg: &LlmModelConfig) -> Result<ModelPresence, AiLlmError> {
        #[derive(Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        let url = format!("{}/api/tags", cfg.endpoint.trim().trim_end_matches('/'));
        let body = self.get_text(&url, None).await?;
        Ok(match serde_json::from_str::<Tags>(&body) {
            Ok(Tags {
                models: Some(models),
            }) => ModelPresence::from_bool(
                models.iter().any(|m| ollama_model_matches(&m.name, &cfg.model)),
            ),
            Ok(Tags { models: None }) => {
                ModelPresence::Unknown("tags response without `models` field".into())
            }
            Err(e) => ModelPresence::Unknown(format!("failed to decode /api/tags: {e}")),
        })
    }

    async fn probe_openai(&self, cfg: &LlmModelConfig) -> Result<ModelPresence, AiLlmError> {
        #[derive(Deserialize)]
        struct ModelItem {
            id: String,
        }
        #[derive(Deserialize)]
        struct Models {
            data: Vec<ModelItem>,
        }

        let api_key = cfg
            .api_key
            .as_deref()
            .ok_or_else(|| HealthError::Decode("missing OpenAI API key".into()))?;
        let auth = header::HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| HealthError::Decode(format!("invalid API key header: {e}")))?;

        let url = format!("{}/v1/models", cfg.endpoint.trim().trim_end_matches('/'));
        let body = self.get_text(&url, Some(auth)).await?;
        Ok(match serde_json::from_str::<Models>(&body) {
            Ok(models) => ModelPresence::from_bool(models.data.iter().any(|m| m.id == cfg.model)),
            Err(e) => ModelPresence::Unknown(format!("failed to decode /v1/models: {e}")),
        })
    }

    async fn get_text(
        &self,
        url: &str,
        auth: Option<header::HeaderValue>,
    ) -> Result<String, AiLlmError> {
        debug!("GET {url}");
        let mut req = self.client.get(url).timeout(self.timeout);
        if let Some(auth) = auth {
            req = req.header(header::AUTHORIZATION, auth);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet: make_snippet(&text),
            })
            .into());
        }
        Ok(text)
    }
}

#[derive(Debug, PartialEq)]
enum ModelPresence {
    Listed,
    Missing,
    Unknown(String),
}

impl ModelPresence {
    fn from_bool(listed: bool) -> Self {
        if listed {
            ModelPresence::Listed
        } else {
            ModelPresence::Missing
        }
    }
}

/// Ollama lists pulled models with an explicit tag (`gpt2:latest`), while
/// configs often omit it.
fn ollama_model_matches(listed: &str, wanted: &str) -> bool {
    if listed == wanted {
        return true;
    }
    match (listed.split_once(':'), wanted.contains(':')) {
        (Some((name, "latest")), false) => name == wanted,
        _ => false,
    }
}
