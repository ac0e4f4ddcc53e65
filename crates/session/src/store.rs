//! Conversation store: one lazily loaded log per key.
//!
//! Each key owns an async mutex around its [`ConversationLog`]. A turn holds
//! that lock from its first read to its last append, so turns on the same key
//! run one after another while different keys proceed in parallel.

use crate::log::ConversationLog;
use robert_core::error::SessionError;
use robert_core::message::{ConversationKey, Message};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Exclusive access to one conversation for the duration of a turn.
pub type SessionGuard = OwnedMutexGuard<ConversationLog>;

/// Maps conversation keys to their logs under a sessions directory.
#[derive(Debug)]
pub struct SessionStore {
    dir: PathBuf,
    sessions: Mutex<HashMap<String, Arc<AsyncMutex<ConversationLog>>>>,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the log for `key` lives.
    ///
    /// Keys that sanitize to the same stem share one file, and therefore one
    /// lock.
    pub fn path_for(&self, key: &ConversationKey) -> PathBuf {
        self.dir.join(format!("{}.jsonl", key.file_stem()))
    }

    /// Wait for exclusive access to `key` and make sure its history is loaded.
    pub async fn lock(&self, key: &ConversationKey) -> Result<SessionGuard, SessionError> {
        let slot = self.slot(key);
        let mut guard = slot.lock_owned().await;
        guard.ensure_loaded().await?;
        Ok(guard)
    }

    /// Snapshot of the history for `key`.
    pub async fn history(&self, key: &ConversationKey) -> Result<Vec<Message>, SessionError> {
        let guard = self.lock(key).await?;
        Ok(guard.messages().to_vec())
    }

    /// Number of conversations touched since startup.
    pub fn open_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn slot(&self, key: &ConversationKey) -> Arc<AsyncMutex<ConversationLog>> {
        let stem = key.file_stem();
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        sessions
            .entry(stem)
            .or_insert_with(|| {
                let path = self.path_for(key);
                debug!(key = %key, path = %path.display(), "Opening conversation");
                Arc::new(AsyncMutex::new(ConversationLog::new(path)))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_survives_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let key = ConversationKey::from("alice");

        {
            let store = SessionStore::new(dir.path());
            let mut log = store.lock(&key).await.unwrap();
            log.append(Message::user("hello")).await.unwrap();
            log.append(Message::assistant("hi there")).await.unwrap();
        }

        let store = SessionStore::new(dir.path());
        let history = store.history(&key).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "hi there");
        assert!(dir.path().join("alice.jsonl").exists());
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store
            .lock(&ConversationKey::from("a"))
            .await
            .unwrap()
            .append(Message::user("for a"))
            .await
            .unwrap();

        assert!(store.history(&ConversationKey::from("b")).await.unwrap().is_empty());
        assert_eq!(store.open_count(), 2);
    }

    #[tokio::test]
    async fn colliding_keys_share_a_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store
            .lock(&ConversationKey::from("User-1"))
            .await
            .unwrap()
            .append(Message::user("x"))
            .await
            .unwrap();

        let other = store.history(&ConversationKey::from("user-1!")).await.unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(store.open_count(), 1);
    }

    #[tokio::test]
    async fn unsafe_keys_stay_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let path = store.path_for(&ConversationKey::from("../../escape"));
        assert_eq!(path, dir.path().join("escape.jsonl"));
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_interleaved() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SessionStore::new(dir.path()));
        let key = ConversationKey::from("busy");

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                let mut log = store.lock(&key).await.unwrap();
                log.append(Message::user(format!("q{i}"))).await.unwrap();
                tokio::task::yield_now().await;
                log.append(Message::assistant(format!("a{i}"))).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let reloaded = ConversationLog::open(dir.path().join("busy.jsonl")).await.unwrap();
        let messages = reloaded.messages();
        assert_eq!(messages.len(), 32);
        for pair in messages.chunks(2) {
            assert_eq!(&pair[0].content[1..], &pair[1].content[1..]);
        }
    }

    #[tokio::test]
    async fn corrupt_log_surfaces_on_lock() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.jsonl"), "garbage\n").unwrap();

        let store = SessionStore::new(dir.path());
        let err = store.lock(&ConversationKey::from("bad")).await.unwrap_err();
        assert!(matches!(err, SessionError::Corrupt { line: 1, .. }));
    }
}
