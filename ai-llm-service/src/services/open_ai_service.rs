//! OpenAI-compatible service for remote text generation.
//!
//! Uses the plain completions endpoint so the remote model receives the
//! exact same prompt as the local runtime:
//! - POST {endpoint}/v1/completions: completion (blocking or SSE stream)
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    config::{
        generation_params::GenerationParams, llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, Result, make_snippet,
    },
    services::stream_lines::{LineBuffer, sse_data},
};

/// Thin client for an OpenAI-compatible completions API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_completions: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `InvalidProvider` if `cfg.provider` is not OpenAI
    /// - [`AiLlmError::Provider`] with `MissingApiKey` if `cfg.api_key` is `None`
    /// - [`AiLlmError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        // 1) Provider must be OpenAI.
        if cfg.provider != LlmProvider::OpenAI {
            return Err(
                ProviderError::new(Provider::OpenAI, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        // 2) API key must be present.
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey)
        })?;

        // 3) Endpoint must use http/https.
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        // 4) HTTP client: timeout + default headers.
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(120));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_completions = format!("{}/v1/completions", base);

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_completions,
        })
    }

    /// Model config this client was built from.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Performs a **non-streaming** completion request.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`AiLlmError::Provider`] with `EmptyChoices` if no choices are returned
    pub async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let started = Instant::now();
        let body = CompletionRequest::new(&self.cfg.model, prompt, params, false);

        debug!(
            model = %self.cfg.model,
            endpoint = %self.cfg.endpoint,
            prompt_len = prompt.len(),
            "POST {}", self.url_completions
        );

        let resp = self
            .client
            .post(&self.url_completions)
            .json(&body)
            .send()
            .await?;
        let resp = self.ensure_success(resp, started).await?;

        let out: CompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode /v1/completions response"
                );
                return Err(ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `choices[0].text`"
                    )),
                )
                .into());
            }
        };

        let text = out
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices))?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "completion completed"
        );

        Ok(text)
    }

    /// Performs a **streaming** completion request (`stream=true`, SSE).
    ///
    /// Each `data:` event carries a partial choice; fragments go to `on_token`
    /// and the concatenated text is returned once `[DONE]` arrives.
    pub async fn generate_stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> Result<String> {
        let started = Instant::now();
        let body = CompletionRequest::new(&self.cfg.model, prompt, params, true);

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            "POST {} (stream)", self.url_completions
        );

        let resp = self
            .client
            .post(&self.url_completions)
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
                done |= apply_sse_line(&line, &mut out, on_token)?;
            }
            if done {
                break;
            }
        }
        if !done {
            if let Some(tail) = lines.finish() {
                apply_sse_line(&tail, &mut out, on_token)?;
            }
        }

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            output_len = out.len(),
            "streaming completion completed"
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
        let url = self.url_completions.clone();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);

        error!(
            %status,
            %url,
            %snippet,
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "OpenAI /v1/completions returned non-success status"
        );

        Err(ProviderError::new(
            Provider::OpenAI,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url,
                snippet,
            }),
        )
        .into())
    }
}

/// Folds one SSE line into `out`. Returns `true` on `[DONE]`.
///
/// Comment lines and events without `data:` are skipped.
fn apply_sse_line(
    line: &str,
    out: &mut String,
    on_token: &mut (dyn FnMut(&str) + Send),
) -> Result<bool> {
    let Some(data) = sse_data(line) else {
        return Ok(false);
    };
    if data == "[DONE]" {
        return Ok(true);
    }
    let chunk: CompletionResponse = serde_json::from_str(data).map_err(|e| {
        AiLlmError::from(ProviderError::new(
            Provider::OpenAI,
            ProviderErrorKind::Decode(format!("invalid stream event: {e}")),
        ))
    })?;
    for choice in chunk.choices {
        if !choice.text.is_empty() {
            on_token(&choice.text);
            out.push_str(&choice.text);
        }
    }
    Ok(false)
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

/// Request body for `/v1/completions`.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
    #[serde(skip_serializing_if = "no_stops")]
    stop: &'a [String],
}

fn no_stops(stop: &&[String]) -> bool {
    stop.is_empty()
}

impl<'a> CompletionRequest<'a> {
    fn new(model: &'a str, prompt: &'a str, params: &'a GenerationParams, stream: bool) -> Self {
        Self {
            model,
            prompt,
            max_tokens: params.max_new_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            stream,
            // The API accepts at most four stop sequences.
            stop: &params.stop[..params.stop.len().min(4)],
        }
    }
}

/// Response (or stream event) body for `/v1/completions`.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}
