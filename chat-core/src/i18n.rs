//! English / Kiswahili labels for the chat UI.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Conversation language selected in the UI.
///
/// Parsing never fails: unknown names fall back to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Language {
    #[default]
    English,
    Kiswahili,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Kiswahili];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Kiswahili => "Kiswahili",
        }
    }

    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "kiswahili" | "swahili" | "sw" | "sw-tz" | "sw-ke" => Language::Kiswahili,
            _ => Language::English,
        }
    }

    pub fn texts(&self) -> &'static LocalizedTexts {
        match self {
            Language::English => &ENGLISH,
            Language::Kiswahili => &KISWAHILI,
        }
    }
}

impl From<String> for Language {
    fn from(s: String) -> Self {
        Language::parse(&s)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every user-visible string of the chat UI in one language.
#[derive(Debug, Serialize)]
pub struct LocalizedTexts {
    pub title: &'static str,
    pub description: &'static str,
    pub system_default: &'static str,
    pub placeholder: &'static str,
    pub thinking: &'static str,
    pub clear: &'static str,
    pub submit: &'static str,
    pub retry: &'static str,
    pub undo: &'static str,
    pub system_label: &'static str,
    pub max_tokens_label: &'static str,
    pub temperature_label: &'static str,
    pub top_p_label: &'static str,
    pub language_label: &'static str,
    pub loading: &'static str,
    pub error: &'static str,
    pub examples_label: &'static str,
    pub examples: [&'static str; 4],
}

impl LocalizedTexts {
    /// Looks a label up by its key name.
    pub fn get(&self, key: &str) -> Option<&'static str> {
        let v = match key {
            "title" => self.title,
            "description" => self.description,
            "system_default" => self.system_default,
            "placeholder" => self.placeholder,
            "thinking" => self.thinking,
            "clear" => self.clear,
            "submit" => self.submit,
            "retry" => self.retry,
            "undo" => self.undo,
            "system_label" => self.system_label,
            "max_tokens_label" => self.max_tokens_label,
            "temperature_label" => self.temperature_label,
            "top_p_label" => self.top_p_label,
            "language_label" => self.language_label,
            "loading" => self.loading,
            "error" => self.error,
            "examples_label" => self.examples_label,
            _ => return None,
        };
        Some(v)
    }
}

/// Label for `key` in `language`, falling back to English and then to the
/// key itself.
pub fn text<'a>(language: Language, key: &'a str) -> &'a str {
    language
        .texts()
        .get(key)
        .or_else(|| ENGLISH.get(key))
        .unwrap_or(key)
}

pub static ENGLISH: LocalizedTexts = LocalizedTexts {
    title: "AI Chat - Local Model",
    description: "Chat with your local AI assistant",
    system_default: "You are a friendly assistant who speaks both English and Swahili.",
    placeholder: "Type your message here...",
    thinking: "Thinking...",
    clear: "Clear Chat",
    submit: "Submit",
    retry: "Retry",
    undo: "Undo",
    system_label: "System Message",
    max_tokens_label: "Max Tokens per Response",
    temperature_label: "Creativity (Temperature)",
    top_p_label: "Top-p Sampling",
    language_label: "Conversation Language",
    loading: "Loading...",
    error: "An error occurred. Please try again later.",
    examples_label: "Example Questions",
    examples: [
        "How are you? Can you tell me about Tanzania?",
        "Please suggest some good Swahili books",
        "Can you help me translate this to English?",
        "Tell me about Swahili culture",
    ],
};

pub static KISWAHILI: LocalizedTexts = LocalizedTexts {
    title: "Mazungumzo ya AI - Modeli ya Ndani",
    description: "Wasiliana na msaidizi wako wa AI wa ndani",
    system_default: "Wewe ni msaidizi mwenye urafiki unaozungumza Kiingereza na Kiswahili.",
    placeholder: "Andika ujumbe wako hapa...",
    thinking: "Inakokotoa...",
    clear: "Futa Mazungumzo",
    submit: "Tuma",
    retry: "Jaribu Tena",
    undo: "Rudisha",
    system_label: "Ujumbe wa Mfumo",
    max_tokens_label: "Upeo wa Vitokezi kwa Majibu",
    temperature_label: "Ubunifu (Joto)",
    top_p_label: "Uchaguzi wa Top-p",
    language_label: "Lugha ya Mazungumzo",
    loading: "Inapakia...",
    error: "Hitilafu imetokea. Tafadhali jaribu tena baadaye.",
    examples_label: "Mifano ya Maswali",
    examples: [
        "Habari yako? Unaweza kuniambia kuhusu Tanzania?",
        "Tafadhali nipe mapendekezo ya vitabu bora vya Kiswahili",
        "Unaweza kunisaidia kutafsiri hii kwa Kiingereza?",
        "Eleza kuhusu utamaduni wa Waswahili",
    ],
};
