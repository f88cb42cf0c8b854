//! Single-user conversation for the terminal chat.

use ai_llm_service::TextGenerator;

use crate::{
    bot::{ChatBot, TurnOptions},
    error::ChatResult,
    history::{ChatHistory, Exchange},
};

/// Words that end the terminal loop ("leave" in Kiswahili).
pub const EXIT_WORDS: [&str; 2] = ["toka", "ondoka"];

pub fn is_exit_word(input: &str) -> bool {
    let input = input.trim();
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

/// A bot that remembers its own conversation.
pub struct ChatSession<G> {
    bot: ChatBot<G>,
    history: ChatHistory,
    opts: TurnOptions,
}

impl<G: TextGenerator> ChatSession<G> {
    pub fn new(bot: ChatBot<G>, opts: TurnOptions) -> Self {
        Self {
            bot,
            history: ChatHistory::new(),
            opts,
        }
    }

    /// Replies to `message` and records the exchange. Failed turns are not
    /// recorded, so the next prompt does not carry them.
    pub async fn chat(&mut self, message: &str) -> ChatResult<String> {
        let reply = self
            .bot
            .respond(self.history.exchanges(), message, &self.opts)
            .await?;
        self.history
            .push(Exchange::new(message.trim(), reply.as_str()));
        Ok(reply)
    }

    /// Forgets the conversation.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn options(&self) -> &TurnOptions {
        &self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bot::tests::ScriptedGenerator, config::ChatConfig, prompt::PromptFormat};

    #[test]
    fn exit_words_are_case_insensitive() {
        assert!(is_exit_word("toka"));
        assert!(is_exit_word("  ONDOKA\n"));
        assert!(!is_exit_word("tokana"));
    }

    #[tokio::test]
    async fn remembers_and_resets_history() {
        let cfg = ChatConfig {
            format: PromptFormat::kiswahili(),
            system_prompt: Some(String::new()),
            ..ChatConfig::default()
        };
        let bot = ChatBot::new(ScriptedGenerator::with_replies(&[" Nzuri", " Asante"]), cfg);
        let mut session = ChatSession::new(bot, TurnOptions::default());

        assert_eq!(session.chat("Habari?").await.unwrap(), "Nzuri");
        assert_eq!(session.chat("Asante").await.unwrap(), "Asante");
        assert_eq!(session.history().len(), 2);

        {
            let prompts = session.bot.generator().prompts.lock().unwrap();
            assert_eq!(
                prompts[1],
                "Mtumiaji: Habari?\nBot: Nzuri\nMtumiaji: Asante\nBot:"
            );
        }

        session.reset();
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn failed_turn_is_not_recorded() {
        let bot = ChatBot::new(ScriptedGenerator::failing(), ChatConfig::default());
        let mut session = ChatSession::new(bot, TurnOptions::default());
        assert!(session.chat("hi").await.is_err());
        assert!(session.history().is_empty());
    }
}
