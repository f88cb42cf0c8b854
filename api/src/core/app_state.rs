use ai_llm_service::{
    LlmClient, config::default_config::config_from_env,
    config::generation_params::SliderBounds,
};
use chat_core::{ChatBot, ChatConfig, SessionStore, TurnOptions};
use tracing::info;

use crate::{error_handler::AppError, routes::chat::chat_request::TurnSettings};

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// Chat bot bound to the configured backend.
    pub bot: ChatBot<LlmClient>,
    /// Server-side conversations.
    pub sessions: SessionStore,
    /// Slider ranges and defaults shown by the UI.
    pub sliders: SliderBounds,
}

impl AppState {
    pub fn new(bot: ChatBot<LlmClient>) -> Self {
        let sessions = SessionStore::new(bot.config().max_sessions);
        let mut sliders = SliderBounds::default();
        if let Some(max_tokens) = bot.generator().config().max_tokens {
            let s = &mut sliders.max_tokens;
            s.value = (max_tokens as f32).clamp(s.minimum, s.maximum);
        }
        Self {
            bot,
            sessions,
            sliders,
        }
    }

    /// Load shared state from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        let llm_cfg = config_from_env()?;
        let chat_cfg = ChatConfig::from_env()?;
        info!(
            provider = %llm_cfg.provider,
            model = %llm_cfg.model,
            endpoint = %llm_cfg.endpoint,
            history_window = chat_cfg.history_window,
            "generation backend configured"
        );
        let client = LlmClient::new(llm_cfg)?;
        Ok(Self::new(ChatBot::new(client, chat_cfg)))
    }

    /// Per-turn options from the request, over the backend defaults.
    pub fn turn_options(&self, settings: TurnSettings) -> TurnOptions {
        let base = self.bot.generator().config().default_params();
        settings.into_options(&base, self.bot.config())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{sync::Arc, time::Duration};

    use ai_llm_service::{LlmModelConfig, LlmProvider};
    use axum::{
        Json, Router,
        body::Body,
        response::{IntoResponse, Response},
        routing::post,
    };
    use serde_json::{Value, json};

    use super::*;

    /// State over an Ollama client at `endpoint`.
    pub(crate) fn state_for(endpoint: String) -> Arc<AppState> {
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "kiswahili-gpt2".into(),
            endpoint,
            api_key: None,
            max_tokens: Some(1000),
            temperature: Some(0.7),
            top_p: Some(0.95),
            top_k: Some(50),
            timeout_secs: Some(5),
        };
        let client = LlmClient::new(cfg).unwrap();
        Arc::new(AppState::new(ChatBot::new(client, ChatConfig::default())))
    }

    /// State over an Ollama client pointed at a closed port.
    pub(crate) fn offline_state() -> Arc<AppState> {
        state_for("http://127.0.0.1:9".into())
    }

    /// Local `/api/generate` that answers `reply` after `delay`, as one JSON
    /// object or as NDJSON split on whitespace when streaming.
    pub(crate) async fn mock_ollama(reply: &'static str, delay: Duration) -> String {
        let app = Router::new().route(
            "/api/generate",
            post(move |Json(body): Json<Value>| async move {
                tokio::time::sleep(delay).await;
                if body["stream"] != true {
                    return Json(json!({ "response": reply, "done": true })).into_response();
                }
                let mut lines: Vec<String> = reply
                    .split_inclusive(' ')
                    .map(|t| json!({ "response": t, "done": false }).to_string() + "\n")
                    .collect();
                lines.push(json!({ "response": "", "done": true }).to_string() + "\n");
                Response::new(Body::from(lines.concat()))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    #[test]
    fn max_tokens_slider_starts_at_clamped_backend_default() {
        let state = offline_state();
        assert_eq!(state.sliders.max_tokens.value, 512.0);
        assert_eq!(state.sliders.temperature, SliderBounds::default().temperature);
    }

    #[test]
    fn turn_options_fall_back_to_backend_defaults() {
        let state = offline_state();
        let opts = state.turn_options(TurnSettings {
            temperature: Some(1.2),
            ..TurnSettings::default()
        });
        assert_eq!(opts.params.max_new_tokens, 1000);
        assert_eq!(opts.params.temperature, 1.2);
        assert_eq!(opts.params.top_k, Some(50));
    }
}
