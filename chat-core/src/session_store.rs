//! Server-side conversations keyed by session id.
//!
//! Lives in the same Tokio runtime as the server. Bounded: once
//! `max_sessions` is reached, creating a session evicts the one touched
//! least recently.
//!
//! Generation runs without holding the store lock, so every session carries
//! a revision that changes on each edit. A turn reads the history together
//! with its revision ([`SessionStore::snapshot`]) and writes its reply back
//! only if the revision is still the same.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::{ChatError, ChatResult},
    history::{ChatHistory, Exchange},
};

#[derive(Debug, Default)]
struct Entry {
    history: ChatHistory,
    touched: u64,
    revision: u64,
}

impl Entry {
    fn expect_revision(&self, id: Uuid, expected: u64) -> ChatResult<()> {
        if self.revision == expected {
            Ok(())
        } else {
            Err(ChatError::SessionChanged(id))
        }
    }

    fn edited(&mut self) -> ChatHistory {
        self.revision += 1;
        self.history.clone()
    }
}

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<Uuid, Entry>,
    clock: u64,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn entry_mut(&mut self, id: Uuid) -> ChatResult<&mut Entry> {
        let now = self.tick();
        let entry = self
            .sessions
            .get_mut(&id)
            .ok_or(ChatError::SessionNotFound(id))?;
        entry.touched = now;
        Ok(entry)
    }
}

#[derive(Debug)]
pub struct SessionStore {
    inner: RwLock<Inner>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Opens an empty conversation and returns its id.
    pub async fn create(&self) -> Uuid {
        let mut inner = self.inner.write().await;
        if inner.sessions.len() >= self.max_sessions {
            let oldest = inner
                .sessions
                .iter()
                .min_by_key(|(_, e)| e.touched)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                inner.sessions.remove(&oldest);
                debug!(session = %oldest, "evicted least recently used session");
            }
        }
        let id = Uuid::new_v4();
        let touched = inner.tick();
        inner.sessions.insert(
            id,
            Entry {
                history: ChatHistory::new(),
                touched,
                revision: 0,
            },
        );
        id
    }

    /// Snapshot of a session's history.
    pub async fn history(&self, id: Uuid) -> ChatResult<ChatHistory> {
        let mut inner = self.inner.write().await;
        Ok(inner.entry_mut(id)?.history.clone())
    }

    /// History of a session together with its current revision.
    pub async fn snapshot(&self, id: Uuid) -> ChatResult<(ChatHistory, u64)> {
        let mut inner = self.inner.write().await;
        let entry = inner.entry_mut(id)?;
        Ok((entry.history.clone(), entry.revision))
    }

    /// Appends an exchange and returns the updated history.
    ///
    /// # Errors
    /// [`ChatError::SessionChanged`] when the session was edited since the
    /// snapshot taken at `revision`.
    pub async fn record(
        &self,
        id: Uuid,
        revision: u64,
        exchange: Exchange,
    ) -> ChatResult<ChatHistory> {
        let mut inner = self.inner.write().await;
        let entry = inner.entry_mut(id)?;
        entry.expect_revision(id, revision)?;
        entry.history.push(exchange);
        Ok(entry.edited())
    }

    /// Replaces the latest exchange (used by retry).
    ///
    /// # Errors
    /// - [`ChatError::SessionChanged`] when the session was edited since the
    ///   snapshot taken at `revision`
    /// - [`ChatError::NothingToRetry`] when the history is empty
    pub async fn replace_last(
        &self,
        id: Uuid,
        revision: u64,
        exchange: Exchange,
    ) -> ChatResult<ChatHistory> {
        let mut inner = self.inner.write().await;
        let entry = inner.entry_mut(id)?;
        entry.expect_revision(id, revision)?;
        entry.history.undo().ok_or(ChatError::NothingToRetry)?;
        entry.history.push(exchange);
        Ok(entry.edited())
    }

    /// Drops the latest exchange and returns the updated history.
    pub async fn undo(&self, id: Uuid) -> ChatResult<ChatHistory> {
        let mut inner = self.inner.write().await;
        let entry = inner.entry_mut(id)?;
        entry.history.undo();
        Ok(entry.edited())
    }

    pub async fn clear(&self, id: Uuid) -> ChatResult<()> {
        let mut inner = self.inner.write().await;
        let entry = inner.entry_mut(id)?;
        entry.history.clear();
        entry.edited();
        Ok(())
    }

    pub async fn remove(&self, id: Uuid) -> ChatResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .sessions
            .remove(&id)
            .map(|_| ())
            .ok_or(ChatError::SessionNotFound(id))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.sessions.is_empty()
    }
}
