//! The chat turn: history in, prompt out, reply back.

use ai_llm_service::{GenerationParams, TextGenerator};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::ChatConfig,
    error::{ChatError, ChatResult},
    history::Exchange,
    i18n::{Language, text},
};

/// Per-turn settings coming from the UI controls.
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    pub params: GenerationParams,
    pub language: Language,
    /// System line override for this turn only.
    pub system: Option<String>,
}

/// Reply shown in the chat view.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// `true` when `text` is the localized failure message.
    pub failed: bool,
}

/// Chat bot over any [`TextGenerator`].
#[derive(Debug)]
pub struct ChatBot<G> {
    generator: G,
    config: ChatConfig,
}

impl<G: TextGenerator> ChatBot<G> {
    pub fn new(generator: G, config: ChatConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Generates the reply to `message` given the prior `history`.
    ///
    /// Only the last `history_window` exchanges reach the prompt.
    ///
    /// # Errors
    /// - [`ChatError::EmptyMessage`] for a blank message
    /// - [`ChatError::Llm`] for invalid parameters or backend failures
    #[instrument(skip_all, fields(language = %opts.language, history = history.len()))]
    pub async fn respond(
        &self,
        history: &[Exchange],
        message: &str,
        opts: &TurnOptions,
    ) -> ChatResult<String> {
        let (prompt, params) = self.prepare(history, message, opts)?;
        let raw = self.generator.generate(&prompt, &params).await?;
        Ok(self.finish(&prompt, &raw))
    }

    /// Like [`ChatBot::respond`], forwarding raw fragments to `on_token` while
    /// the backend streams. The returned reply is the cleaned full text.
    #[instrument(skip_all, fields(language = %opts.language, history = history.len()))]
    pub async fn respond_stream(
        &self,
        history: &[Exchange],
        message: &str,
        opts: &TurnOptions,
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> ChatResult<String> {
        let (prompt, params) = self.prepare(history, message, opts)?;
        let raw = self
            .generator
            .generate_stream(&prompt, &params, on_token)
            .await?;
        Ok(self.finish(&prompt, &raw))
    }

    /// [`ChatBot::respond`] with backend failures rendered as a localized
    /// message instead of an error. Input errors are still returned.
    pub async fn reply(
        &self,
        history: &[Exchange],
        message: &str,
        opts: &TurnOptions,
    ) -> ChatResult<Reply> {
        let result = self.respond(history, message, opts).await;
        settle(result, opts.language)
    }

    /// Streaming counterpart of [`ChatBot::reply`].
    pub async fn reply_stream(
        &self,
        history: &[Exchange],
        message: &str,
        opts: &TurnOptions,
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> ChatResult<Reply> {
        let result = self.respond_stream(history, message, opts, on_token).await;
        settle(result, opts.language)
    }

    fn prepare(
        &self,
        history: &[Exchange],
        message: &str,
        opts: &TurnOptions,
    ) -> ChatResult<(String, GenerationParams)> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        opts.params.validate()?;

        let window_start = history.len().saturating_sub(self.config.history_window);
        let window = &history[window_start..];
        let system = opts
            .system
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.config.system_prompt_for(opts.language));

        let prompt = self.config.format.build_prompt(system, window, message);
        let params = opts
            .params
            .clone()
            .with_stop(self.config.format.stop_sequences());

        debug!(
            prompt_len = prompt.len(),
            exchanges_used = window.len(),
            max_new_tokens = params.max_new_tokens,
            "prompt built"
        );
        Ok((prompt, params))
    }

    fn finish(&self, prompt: &str, raw: &str) -> String {
        let reply = self.config.format.extract_reply(prompt, raw);
        info!(raw_len = raw.len(), reply_len = reply.len(), "reply generated");
        reply
    }
}

fn settle(result: ChatResult<String>, language: Language) -> ChatResult<Reply> {
    match result {
        Ok(text) => Ok(Reply {
            text,
            failed: false,
        }),
        Err(err) if err.is_client_error() => Err(err),
        Err(err) => {
            warn!(error = %err, "generation failed");
            Ok(Reply {
                text: render_failure(language, &err),
                failed: true,
            })
        }
    }
}

/// The message the chat shows when generation fails.
pub fn render_failure(language: Language, err: &dyn std::error::Error) -> String {
    format!("❌ {}\n\nError: {}", text(language, "error"), err)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use ai_llm_service::{
        AiLlmError, Result as LlmResult,
        error_handler::{Provider, ProviderError, ProviderErrorKind},
    };

    use super::*;

    /// Generator that records prompts and answers from a script.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedGenerator {
        pub replies: Mutex<Vec<String>>,
        pub prompts: Mutex<Vec<String>>,
        pub stops: Mutex<Vec<Vec<String>>>,
        pub fail: bool,
    }

    impl ScriptedGenerator {
        pub(crate) fn with_replies(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                ..Default::default()
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn next(&self, prompt: &str, params: &GenerationParams) -> LlmResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.stops.lock().unwrap().push(params.stop.clone());
            if self.fail {
                return Err(AiLlmError::from(ProviderError::new(
                    Provider::Ollama,
                    ProviderErrorKind::Decode("connection refused".into()),
                )));
            }
            Ok(self.replies.lock().unwrap().pop().unwrap_or_default())
        }
    }

    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str, params: &GenerationParams) -> LlmResult<String> {
            self.next(prompt, params)
        }

        async fn generate_stream(
            &self,
            prompt: &str,
            params: &GenerationParams,
            on_token: &mut (dyn FnMut(&str) + Send),
        ) -> LlmResult<String> {
            let out = self.next(prompt, params)?;
            for word in out.split_inclusive(' ') {
                on_token(word);
            }
            Ok(out)
        }
    }

    fn history(n: usize) -> Vec<Exchange> {
        (0..n)
            .map(|i| Exchange::new(format!("q{i}"), format!("a{i}")))
            .collect()
    }

    #[tokio::test]
    async fn prompt_holds_only_the_last_six_exchanges() {
        let bot = ChatBot::new(ScriptedGenerator::with_replies(&[" ok"]), ChatConfig::default());
        let reply = bot
            .respond(&history(9), "next", &TurnOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "ok");

        let prompts = bot.generator().prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(!prompt.contains("User: q2\n"));
        assert!(prompt.contains("User: q3\nBot: a3\n"));
        assert!(prompt.ends_with("User: q8\nBot: a8\nUser: next\nBot:"));
        assert!(prompt.starts_with(Language::English.texts().system_default));
    }

    #[tokio::test]
    async fn strips_echo_and_invented_turns() {
        let bot = ChatBot::new(
            ScriptedGenerator::with_replies(&["User: hi\nBot: Hello!\nUser: more"]),
            ChatConfig {
                system_prompt: Some(String::new()),
                ..ChatConfig::default()
            },
        );
        let opts = TurnOptions {
            system: Some("   ".into()),
            ..TurnOptions::default()
        };
        assert_eq!(bot.respond(&[], "hi", &opts).await.unwrap(), "Hello!");
    }

    #[tokio::test]
    async fn passes_user_turn_as_stop_sequence() {
        let bot = ChatBot::new(ScriptedGenerator::with_replies(&["x"]), ChatConfig::default());
        bot.respond(&[], "hi", &TurnOptions::default()).await.unwrap();
        let stops = bot.generator().stops.lock().unwrap();
        assert_eq!(stops[0], vec!["\nUser:".to_string()]);
    }

    #[tokio::test]
    async fn rejects_blank_message_and_bad_params() {
        let bot = ChatBot::new(ScriptedGenerator::default(), ChatConfig::default());
        let err = bot.respond(&[], "  \n", &TurnOptions::default()).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));

        let opts = TurnOptions {
            params: GenerationParams {
                temperature: 9.0,
                ..GenerationParams::default()
            },
            ..TurnOptions::default()
        };
        let err = bot.reply(&[], "hi", &opts).await.unwrap_err();
        assert!(err.is_client_error());
        assert!(bot.generator().prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_becomes_localized_reply() {
        let bot = ChatBot::new(ScriptedGenerator::failing(), ChatConfig::default());
        let opts = TurnOptions {
            language: Language::Kiswahili,
            ..TurnOptions::default()
        };
        let reply = bot.reply(&[], "Habari", &opts).await.unwrap();
        assert!(reply.failed);
        assert!(reply.text.starts_with("❌ Hitilafu imetokea."));
        assert!(reply.text.contains("\n\nError: "));
        assert!(reply.text.contains("connection refused"));
    }

    #[tokio::test]
    async fn streaming_forwards_fragments_and_returns_clean_reply() {
        let bot = ChatBot::new(
            ScriptedGenerator::with_replies(&[" Karibu sana rafiki"]),
            ChatConfig::default(),
        );
        let mut fragments = Vec::new();
        let reply = bot
            .reply_stream(&[], "Jambo", &TurnOptions::default(), &mut |t: &str| {
                fragments.push(t.to_string())
            })
            .await
            .unwrap();
        assert_eq!(reply.text, "Karibu sana rafiki");
        assert!(!reply.failed);
        assert_eq!(fragments.concat(), " Karibu sana rafiki");
    }
}
