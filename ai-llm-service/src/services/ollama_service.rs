//! Lightweight Ollama client for text generation.
//!
//! Talks to the local Ollama runtime:
//! - `POST {endpoint}/api/generate` with `stream=false`: blocking generation
//! - `POST {endpoint}/api/generate` with `stream=true` : NDJSON token stream
//!
//! Requests are sent with `raw=true`, so Ollama applies no chat template and
//! the model sees exactly the prompt built by the caller, like a plain
//! causal LM `generate` call.
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::{GenerationParams, LlmModelConfig, LlmProvider};
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "gpt2".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     max_tokens: Some(200),
//!     temperature: Some(0.7),
//!     top_p: Some(0.95),
//!     top_k: Some(50),
//!     timeout_secs: Some(120),
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! let text = svc.generate("User: Habari?\nBot:", &GenerationParams::default()).await?;
//! println!("{text}");
//! # Ok(()) }
//! ```

use std::time::{Duration, Instant};

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{
        generation_params::GenerationParams, llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, Result, make_snippet,
    },
    services::stream_lines::LineBuffer,
};

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a configurable timeout.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(120));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_generate = format!("{}/api/generate", base);

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OllamaService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
        })
    }

    /// Model config this client was built from.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Performs a **non-streaming** generation request.
    ///
    /// Mapped options:
    /// - `num_predict` ← `params.max_new_tokens`
    /// - `temperature`, `top_p`, `top_k`, `stop` ← `params`
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client errors
    /// - `Decode` if response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let started = Instant::now();
        let body = GenerateRequest::new(&self.cfg.model, prompt, params, false);

        debug!(prompt_len = prompt.len(), "POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;
        let resp = self.ensure_success(resp, started).await?;

        let out: GenerateResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; ensure `stream=false` is used"
                )),
            )
        })?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            output_len = out.response.len(),
            "generation completed"
        );
        Ok(out.response)
    }

    /// Performs a **streaming** generation request.
    ///
    /// Every non-empty fragment is handed to `on_token` as soon as its NDJSON
    /// line is complete; the concatenated text is returned at the end.
    ///
    /// # Errors
    /// Same as [`OllamaService::generate`], plus `Decode` when the stream
    /// carries an `error` object.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate_stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> Result<String> {
        let started = Instant::now();
        let body = GenerateRequest::new(&self.cfg.model, prompt, params, true);

        debug!(prompt_len = prompt.len(), "POST {} (stream)", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;
        let resp = self.ensure_success(resp, started).await?;

        let mut out = String::new();
        let mut lines = LineBuffer::default();
        let mut bytes = resp.bytes_stream();
        let mut done = false;

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            for line in lines.push(&chunk) {
                done |= apply_stream_line(&line, &mut out, on_token)?;
            }
            if done {
                break;
            }
        }
        if !done {
            if let Some(tail) = lines.finish() {
                apply_stream_line(&tail, &mut out, on_token)?;
            }
        }

        info!(
            latency_ms = started.elapsed().as_millis(),
            output_len = out.len(),
            "streaming generation completed"
        );
        Ok(out)
    }

    async fn ensure_success(
        &self,
        resp: reqwest::Response,
        started: Instant,
    ) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let url = self.url_generate.clone();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);

        error!(
            %status,
            %url,
            %snippet,
            latency_ms = started.elapsed().as_millis(),
            "Ollama /api/generate returned non-success status"
        );

        Err(ProviderError::new(
            Provider::Ollama,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url,
                snippet,
            }),
        )
        .into())
    }
}

/// Folds one NDJSON line into `out`. Returns `true` once Ollama reports `done`.
fn apply_stream_line(
    line: &str,
    out: &mut String,
    on_token: &mut (dyn FnMut(&str) + Send),
) -> Result<bool> {
    let chunk: StreamChunk = serde_json::from_str(line).map_err(|e| {
        AiLlmError::from(ProviderError::new(
            Provider::Ollama,
            ProviderErrorKind::Decode(format!("invalid stream line: {e}")),
        ))
    })?;
    if let Some(err) = chunk.error {
        return Err(ProviderError::new(Provider::Ollama, ProviderErrorKind::Decode(err)).into());
    }
    if !chunk.response.is_empty() {
        on_token(&chunk.response);
        out.push_str(&chunk.response);
    }
    Ok(chunk.done)
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    raw: bool,
    options: GenerateOptions<'a>,
}

impl<'a> GenerateRequest<'a> {
    fn new(model: &'a str, prompt: &'a str, params: &'a GenerationParams, stream: bool) -> Self {
        Self {
            model,
            prompt,
            stream,
            raw: true,
            options: GenerateOptions {
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
                num_predict: params.max_new_tokens,
                stop: &params.stop,
            },
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Serialize)]
struct GenerateOptions<'a> {
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    num_predict: u32,
    #[serde(skip_serializing_if = "no_stops")]
    stop: &'a [String],
}

fn no_stops(stop: &&[String]) -> bool {
    stop.is_empty()
}

/// Response body for `/api/generate` with `stream=false`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// One NDJSON line of a streamed `/api/generate` response.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}
