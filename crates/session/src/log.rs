//! A single conversation persisted as JSON lines.
//!
//! One `Message` per line, appended in order. Every append opens the file in
//! append mode, writes exactly one newline-terminated line, and syncs before
//! the in-memory copy is updated, so a crash loses at most the line that was
//! being written.
//!
//! Storage location: `<sessions_dir>/<key stem>.jsonl`

use robert_core::error::SessionError;
use robert_core::message::Message;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// In-memory view of one conversation plus the file that backs it.
///
/// The file is read lazily on first use; see [`ConversationLog::ensure_loaded`].
#[derive(Debug)]
pub struct ConversationLog {
    path: PathBuf,
    messages: Vec<Message>,
    loaded: bool,
    /// File length covered by `messages`. Bytes past it (a torn final line,
    /// or what a failed append left behind) are cut off before the next append.
    committed_len: u64,
    /// The last line parsed fine but has no trailing newline.
    needs_newline: bool,
}

impl ConversationLog {
    /// A log backed by `path`. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            messages: Vec::new(),
            loaded: false,
            committed_len: 0,
            needs_newline: false,
        }
    }

    /// Open and fully load the log at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let mut log = Self::new(path);
        log.ensure_loaded().await?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record, in file order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Read the backing file if that has not happened yet.
    ///
    /// A missing file is an empty conversation. A final line without a
    /// terminating newline that fails to parse is treated as an interrupted
    /// write: it is skipped here and truncated away before the next append.
    /// Any other unparseable line is an error.
    pub async fn ensure_loaded(&mut self) -> Result<(), SessionError> {
        if self.loaded {
            return Ok(());
        }

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(SessionError::Storage(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let mut messages = Vec::new();
        let mut offset: u64 = 0;
        self.committed_len = content.len() as u64;
        self.needs_newline = false;

        for (index, raw) in content.split_inclusive('\n').enumerate() {
            let start = offset;
            offset += raw.len() as u64;

            let terminated = raw.ends_with('\n');
            let line = raw.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Message>(line) {
                Ok(message) => {
                    messages.push(message);
                    self.needs_newline = !terminated;
                }
                Err(e) if !terminated => {
                    warn!(
                        path = %self.path.display(),
                        line = index + 1,
                        error = %e,
                        "Ignoring incomplete final record"
                    );
                    self.committed_len = start;
                }
                Err(e) => {
                    return Err(SessionError::Corrupt {
                        path: self.path.clone(),
                        line: index + 1,
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(path = %self.path.display(), count = messages.len(), "Conversation loaded");
        self.messages = messages;
        self.loaded = true;
        Ok(())
    }

    /// Durably append one record.
    ///
    /// The in-memory history only grows once the line is on disk.
    pub async fn append(&mut self, message: Message) -> Result<(), SessionError> {
        self.ensure_loaded().await?;

        let mut line = serde_json::to_string(&message)
            .map_err(|e| SessionError::Storage(format!("Failed to serialize message: {e}")))?;
        line.push('\n');
        if self.needs_newline {
            line.insert(0, '\n');
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SessionError::Storage(format!("Failed to create sessions directory: {e}"))
            })?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.storage_error("open", e))?;

        let on_disk = file
            .metadata()
            .await
            .map_err(|e| self.storage_error("stat", e))?
            .len();
        if on_disk > self.committed_len {
            warn!(
                path = %self.path.display(),
                bytes = on_disk - self.committed_len,
                "Truncating incomplete record left by an earlier write"
            );
            file.set_len(self.committed_len)
                .await
                .map_err(|e| self.storage_error("truncate", e))?;
        }

        if let Err(e) = write_line(&mut file, line.as_bytes()).await {
            // Keep the file line-aligned; if this fails too, the next append retries.
            if let Err(cut) = file.set_len(self.committed_len).await {
                warn!(path = %self.path.display(), error = %cut, "Could not roll back failed append");
            }
            return Err(self.storage_error("append to", e));
        }

        self.committed_len += line.len() as u64;
        self.needs_newline = false;
        self.messages.push(message);
        Ok(())
    }

    fn storage_error(&self, action: &str, err: std::io::Error) -> SessionError {
        SessionError::Storage(format!("Failed to {action} {}: {err}", self.path.display()))
    }
}

async fn write_line(file: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_data().await
}
