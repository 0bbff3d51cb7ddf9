//! Chat transcript persistence
//!
//! Each session's conversation is stored as `sessions/<session_id>.json`:
//!
//! ```json
//! {"chat_history": [{"role": "user", "content": "..."}, {"role": "assistant", "content": "..."}]}
//! ```
//!
//! A transcript is read once at the start of an interaction cycle and
//! written once at the end. Writes replace the whole file through a temp
//! file and an atomic rename, so a crash mid-write leaves the previous
//! transcript intact.

use crate::error::{ChatterError, Result};
use crate::storage::StorageLayout;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Author of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_chatter::transcript::{Message, Role};
    ///
    /// let msg = Message::user("What is the summary?");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, append-only sequence of messages for one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end of the conversation
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append a completed question/answer turn, user first
    pub fn push_turn(&mut self, query: impl Into<String>, answer: impl Into<String>) {
        self.push(Message::user(query));
        self.push(Message::assistant(answer));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Serialized shape of a transcript file
#[derive(Debug, Serialize, Deserialize)]
struct TranscriptFile {
    #[serde(default)]
    chat_history: Vec<Message>,
}

/// File-backed transcript store
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    layout: StorageLayout,
}

impl TranscriptStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Path of the transcript file for a session
    pub fn path(&self, session_id: &str) -> PathBuf {
        self.layout.transcript_path(session_id)
    }

    /// Load a session's transcript
    ///
    /// A missing file is an empty transcript, not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(&self, session_id: &str) -> Result<Transcript> {
        let path = self.path(session_id);
        if !path.exists() {
            tracing::debug!("No transcript for session {}", session_id);
            return Ok(Transcript::new());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read transcript {}", path.display()))?;
        let file: TranscriptFile = serde_json::from_str(&contents).map_err(|e| {
            ChatterError::Storage(format!(
                "Failed to parse transcript {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(
            "Loaded {} messages for session {}",
            file.chat_history.len(),
            session_id
        );
        Ok(Transcript::from(file.chat_history))
    }

    /// Replace a session's transcript on disk
    ///
    /// # Errors
    ///
    /// Returns error if serialization or any filesystem step fails
    pub fn save(&self, session_id: &str, transcript: &Transcript) -> Result<()> {
        let path = self.path(session_id);
        let file = TranscriptFile {
            chat_history: transcript.messages().to_vec(),
        };
        let json = serde_json::to_string(&file)?;
        atomic_write(&path, json.as_bytes())
            .with_context(|| format!("Failed to write transcript {}", path.display()))?;

        tracing::debug!(
            "Saved {} messages for session {}",
            transcript.len(),
            session_id
        );
        Ok(())
    }

    /// Delete a session's transcript, returning whether a file was removed
    pub fn remove(&self, session_id: &str) -> Result<bool> {
        let path = self.path(session_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove transcript {}", path.display()))?;
        Ok(true)
    }
}

/// Write `contents` to a `.tmp` sibling, fsync, then rename over `path`
fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut tmp_file = File::create(&tmp_path)?;
    tmp_file.write_all(contents)?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    fs::rename(&tmp_path, path)
}
