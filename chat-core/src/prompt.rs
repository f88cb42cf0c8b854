//! Plain-text prompt format and reply extraction.
//!
//! A prompt looks like:
//!
//! ```text
//! You are a friendly assistant who speaks both English and Swahili.
//! User: Habari?
//! Bot: Nzuri sana!
//! User: Tell me about Tanzania
//! Bot:
//! ```
//!
//! The model continues after the final `Bot:`. Some backends echo the prompt
//! and most small models keep going with an invented `User:` turn, so the
//! raw output is cleaned by [`PromptFormat::extract_reply`].

use serde::{Deserialize, Serialize};

use crate::history::Exchange;

/// Speaker labels used in the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptFormat {
    pub user_label: String,
    pub bot_label: String,
}

impl Default for PromptFormat {
    fn default() -> Self {
        Self::new("User", "Bot")
    }
}

impl PromptFormat {
    pub fn new(user_label: impl Into<String>, bot_label: impl Into<String>) -> Self {
        Self {
            user_label: user_label.into(),
            bot_label: bot_label.into(),
        }
    }

    /// Labels of the Kiswahili terminal bot (`Mtumiaji` / `Bot`).
    pub fn kiswahili() -> Self {
        Self::new("Mtumiaji", "Bot")
    }

    fn bot_marker(&self) -> String {
        format!("{}:", self.bot_label)
    }

    fn user_marker(&self) -> String {
        format!("{}:", self.user_label)
    }

    /// Sequences that should end generation: the start of a new user turn.
    pub fn stop_sequences(&self) -> Vec<String> {
        vec![format!("\n{}", self.user_marker())]
    }

    /// Builds the prompt from an optional system line, prior exchanges and
    /// the new message. The caller decides how much history to pass.
    pub fn build_prompt(&self, system: &str, history: &[Exchange], message: &str) -> String {
        let mut out = String::new();
        let system = system.trim();
        if !system.is_empty() {
            out.push_str(system);
            out.push('\n');
        }
        for ex in history {
            self.push_turn(&mut out, &self.user_label, &ex.user);
            self.push_turn(&mut out, &self.bot_label, &ex.bot);
        }
        self.push_turn(&mut out, &self.user_label, message);
        out.push_str(&self.bot_marker());
        out
    }

    fn push_turn(&self, out: &mut String, label: &str, text: &str) {
        out.push_str(label);
        out.push_str(": ");
        out.push_str(text.trim());
        out.push('\n');
    }

    /// Turns raw generated text into the reply shown to the user.
    ///
    /// 1. Drops the prompt echo: an exact prefix, or everything up to the end
    ///    of the (trimmed) prompt when it appears inside the output.
    /// 2. Drops a leading `Bot:` label the model may repeat.
    /// 3. Cuts at the first invented user turn.
    /// 4. Trims surrounding whitespace.
    pub fn extract_reply(&self, prompt: &str, generated: &str) -> String {
        let trimmed_prompt = prompt.trim();
        let mut text = if let Some(rest) = generated.strip_prefix(prompt) {
            rest
        } else if let Some(pos) = (!trimmed_prompt.is_empty())
            .then(|| generated.find(trimmed_prompt))
            .flatten()
        {
            &generated[pos + trimmed_prompt.len()..]
        } else {
            generated
        };

        text = text.trim_start();
        let bot_marker = self.bot_marker();
        if let Some(rest) = text.strip_prefix(bot_marker.as_str()) {
            text = rest;
        }

        let user_marker = self.user_marker();
        let cut = if text.trim_start().starts_with(user_marker.as_str()) {
            Some(0)
        } else {
            text.find(&format!("\n{user_marker}"))
        };
        if let Some(cut) = cut {
            text = &text[..cut];
        }

        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_prompt_with_system_history_and_marker() {
        let f = PromptFormat::default();
        let history = vec![Exchange::new("Habari?", "Nzuri sana!")];
        let prompt = f.build_prompt("  Be kind.  ", &history, " Tell me about Tanzania ");
        assert_eq!(
            prompt,
            "Be kind.\nUser: Habari?\nBot: Nzuri sana!\nUser: Tell me about Tanzania\nBot:"
        );
    }

    #[test]
    fn empty_system_is_omitted() {
        let f = PromptFormat::kiswahili();
        assert_eq!(f.build_prompt("", &[], "Jambo"), "Mtumiaji: Jambo\nBot:");
    }

    #[test]
    fn strips_exact_prompt_echo() {
        let f = PromptFormat::default();
        let prompt = f.build_prompt("", &[], "hi");
        let generated = format!("{prompt} Hello there!");
        assert_eq!(f.extract_reply(&prompt, &generated), "Hello there!");
    }

    #[test]
    fn strips_echo_with_whitespace_differences() {
        let f = PromptFormat::default();
        let prompt = f.build_prompt("Be kind.", &[], "hi");
        let generated = format!("\n{prompt}  Karibu!\n");
        assert_eq!(f.extract_reply(&prompt, &generated), "Karibu!");
    }

    #[test]
    fn cuts_at_invented_user_turn() {
        let f = PromptFormat::default();
        let prompt = f.build_prompt("", &[], "hi");
        let generated = " Hello!\nHow can I help?\nUser: what else\nBot: more";
        assert_eq!(f.extract_reply(&prompt, generated), "Hello!\nHow can I help?");
    }

    #[test]
    fn repeated_bot_label_and_immediate_user_turn() {
        let f = PromptFormat::default();
        assert_eq!(f.extract_reply("p", "Bot: Sawa."), "Sawa.");
        assert_eq!(f.extract_reply("p", "\nUser: hello"), "");
    }

    #[test]
    fn stop_sequences_start_a_new_user_turn() {
        assert_eq!(PromptFormat::kiswahili().stop_sequences(), vec!["\nMtumiaji:"]);
    }
}
