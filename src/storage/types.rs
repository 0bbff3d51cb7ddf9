use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file handed to the chatbot for indexing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original file name as supplied by the user
    pub name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Creates an upload from a name and its contents
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// On-disk footprint of a session identifier, gathered from all three roots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier (directory or file stem)
    pub id: String,
    /// Number of messages in the transcript, 0 when there is none
    pub message_count: usize,
    /// Number of files in the upload directory
    pub upload_count: usize,
    /// Whether an index directory exists for the identifier
    pub has_index: bool,
    /// Last modification time of the transcript file
    pub updated_at: Option<DateTime<Utc>>,
}
