//! Conversation history as a list of user/bot exchanges.

use serde::{Deserialize, Serialize};

/// Number of most recent exchanges that go into a prompt.
pub const DEFAULT_HISTORY_WINDOW: usize = 6;

/// One user message and the reply it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub bot: String,
}

impl Exchange {
    pub fn new(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            bot: bot.into(),
        }
    }
}

/// Ordered conversation, oldest exchange first.
///
/// Serializes as a plain array so the browser can send its chat view back
/// as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    exchanges: Vec<Exchange>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, exchange: Exchange) {
        self.exchanges.push(exchange);
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    /// Removes and returns the most recent exchange.
    pub fn undo(&mut self) -> Option<Exchange> {
        self.exchanges.pop()
    }

    pub fn last_user_message(&self) -> Option<&str> {
        self.exchanges.last().map(|e| e.user.as_str())
    }

    /// The last `n` exchanges, or all of them when there are fewer.
    pub fn recent(&self, n: usize) -> &[Exchange] {
        let start = self.exchanges.len().saturating_sub(n);
        &self.exchanges[start..]
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

impl From<Vec<Exchange>> for ChatHistory {
    fn from(exchanges: Vec<Exchange>) -> Self {
        Self { exchanges }
    }
}

impl FromIterator<Exchange> for ChatHistory {
    fn from_iter<I: IntoIterator<Item = Exchange>>(iter: I) -> Self {
        Self {
            exchanges: iter.into_iter().collect(),
        }
    }
}
