//! Chat behaviour loaded from environment variables.
//!
//! - `CHAT_HISTORY_WINDOW`   = exchanges included in the prompt (default 6)
//! - `CHAT_SYSTEM_PROMPT`    = system line (default: localized `system_default`)
//! - `CHAT_DEFAULT_LANGUAGE` = `English` or `Kiswahili` (default English)
//! - `CHAT_MAX_SESSIONS`     = live server-side sessions (default 1024)
//! - `CHAT_USER_LABEL` / `CHAT_BOT_LABEL` = speaker labels (default `User` / `Bot`)

use ai_llm_service::error_handler::parse_opt_number;

use crate::{
    error::ChatResult, history::DEFAULT_HISTORY_WINDOW, i18n::Language, prompt::PromptFormat,
};

pub const DEFAULT_MAX_SESSIONS: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub history_window: usize,
    /// Overrides the localized default system line when set.
    pub system_prompt: Option<String>,
    pub default_language: Language,
    pub max_sessions: usize,
    pub format: PromptFormat,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            system_prompt: None,
            default_language: Language::English,
            max_sessions: DEFAULT_MAX_SESSIONS,
            format: PromptFormat::default(),
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> ChatResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ChatResult<Self>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let history_window =
            parse_opt_number::<usize>(get("CHAT_HISTORY_WINDOW"), "CHAT_HISTORY_WINDOW", "expected usize")?
                .unwrap_or(defaults.history_window);
        let max_sessions =
            parse_opt_number::<usize>(get("CHAT_MAX_SESSIONS"), "CHAT_MAX_SESSIONS", "expected usize")?
                .unwrap_or(defaults.max_sessions)
                .max(1);
        let default_language = get("CHAT_DEFAULT_LANGUAGE")
            .map(|s| Language::parse(&s))
            .unwrap_or(defaults.default_language);
        let format = PromptFormat::new(
            get("CHAT_USER_LABEL").unwrap_or(defaults.format.user_label),
            get("CHAT_BOT_LABEL").unwrap_or(defaults.format.bot_label),
        );

        Ok(Self {
            history_window,
            system_prompt: get("CHAT_SYSTEM_PROMPT"),
            default_language,
            max_sessions,
            format,
        })
    }

    /// System line for `language`: the configured override, else the
    /// localized default.
    pub fn system_prompt_for(&self, language: Language) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(language.texts().system_default)
    }
}
