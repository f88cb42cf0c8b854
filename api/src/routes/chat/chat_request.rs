use ai_llm_service::GenerationParams;
use chat_core::{ChatConfig, ChatHistory, Exchange, Language, Reply, TurnOptions};
use serde::{Deserialize, Serialize};

/// UI controls sent with every message. Missing values use the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct TurnSettings {
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub language: Option<Language>,
    /// System message textbox; blank means the localized default.
    #[serde(default)]
    pub system: Option<String>,
}

impl TurnSettings {
    pub fn into_options(self, base: &GenerationParams, cfg: &ChatConfig) -> TurnOptions {
        let params = GenerationParams {
            max_new_tokens: self.max_tokens.unwrap_or(base.max_new_tokens),
            temperature: self.temperature.unwrap_or(base.temperature),
            top_p: self.top_p.unwrap_or(base.top_p),
            ..base.clone()
        };
        TurnOptions {
            params,
            language: self.language.unwrap_or(cfg.default_language),
            system: self.system.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Request payload for `/api/chat` and `/api/chat/stream`.
///
/// The browser owns the conversation and sends it back with each message.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: ChatHistory,
    #[serde(flatten)]
    pub settings: TurnSettings,
}

/// Response payload for the stateless chat routes.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    /// Conversation including the new exchange (unchanged when `failed`).
    pub history: ChatHistory,
    /// `reply` is the localized failure message.
    pub failed: bool,
}

impl ChatResponse {
    pub fn new(mut history: ChatHistory, message: &str, reply: Reply) -> Self {
        if !reply.failed {
            history.push(Exchange::new(message.trim(), reply.text.as_str()));
        }
        Self {
            reply: reply.text,
            history,
            failed: reply.failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gradio_style_request() {
        let req: ChatRequest = serde_json::from_str(
            r#"{
                "message": "Habari?",
                "history": [{"user": "Jambo", "bot": "Sijambo"}],
                "max_tokens": 128,
                "temperature": 0.3,
                "language": "Kiswahili",
                "system": "  "
            }"#,
        )
        .unwrap();
        assert_eq!(req.history.len(), 1);

        let base = GenerationParams::default();
        let opts = req.settings.into_options(&base, &ChatConfig::default());
        assert_eq!(opts.params.max_new_tokens, 128);
        assert_eq!(opts.params.temperature, 0.3);
        assert_eq!(opts.params.top_p, base.top_p);
        assert_eq!(opts.language, Language::Kiswahili);
        assert_eq!(opts.system, None);
    }

    #[test]
    fn minimal_request_uses_defaults() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert!(req.history.is_empty());
        let cfg = ChatConfig {
            default_language: Language::Kiswahili,
            ..ChatConfig::default()
        };
        let opts = req.settings.into_options(&GenerationParams::default(), &cfg);
        assert_eq!(opts.language, Language::Kiswahili);
        assert_eq!(opts.params, GenerationParams::default());
    }

    #[test]
    fn failed_reply_is_not_added_to_history() {
        let ok = ChatResponse::new(
            ChatHistory::new(),
            " hi ",
            Reply {
                text: "hello".into(),
                failed: false,
            },
        );
        assert_eq!(ok.history.exchanges(), &[Exchange::new("hi", "hello")]);

        let failed = ChatResponse::new(
            ChatHistory::new(),
            "hi",
            Reply {
                text: "❌ oops".into(),
                failed: true,
            },
        );
        assert!(failed.history.is_empty());
        assert!(failed.failed);
    }
}
