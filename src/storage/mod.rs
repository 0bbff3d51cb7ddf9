//! On-disk layout for uploads, indexes and transcripts
//!
//! Everything PDF Chatter persists lives under three roots below a single
//! working directory:
//!
//! - `uploaded_documents/<session_id>/<file>`: raw uploaded files
//! - `.byaldi/<session_id>/`: persisted retrieval index (opaque)
//! - `sessions/<session_id>.json`: chat transcript
//!
//! The directory names are configurable through [`StorageConfig`].

use crate::config::StorageConfig;
use crate::error::{ChatterError, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub mod types;
pub use types::{SessionSummary, UploadedFile};

/// Extension used for transcript files
const TRANSCRIPT_EXTENSION: &str = "json";

/// Resolved paths of the three storage roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    upload_root: PathBuf,
    index_root: PathBuf,
    session_root: PathBuf,
}

impl StorageLayout {
    /// Resolve the layout from configuration without touching the disk
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            upload_root: config.root.join(&config.upload_dir),
            index_root: config.root.join(&config.index_dir),
            session_root: config.root.join(&config.session_dir),
        }
    }

    /// Resolve the default directory names below `root`
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_chatter::storage::StorageLayout;
    ///
    /// let layout = StorageLayout::with_root("/tmp/chatter");
    /// assert!(layout.index_root().ends_with(".byaldi"));
    /// ```
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let config = StorageConfig {
            root: root.into(),
            ..StorageConfig::default()
        };
        Self::from_config(&config)
    }

    /// Create all three roots, including intermediate directories
    ///
    /// Idempotent. Any failure here is fatal to startup.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [&self.upload_root, &self.index_root, &self.session_root] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))
                .map_err(|e| ChatterError::Storage(format!("{:#}", e)))?;
        }
        tracing::debug!(
            "Storage layout ready: uploads={}, indexes={}, sessions={}",
            self.upload_root.display(),
            self.index_root.display(),
            self.session_root.display()
        );
        Ok(())
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    pub fn index_root(&self) -> &Path {
        &self.index_root
    }

    pub fn session_root(&self) -> &Path {
        &self.session_root
    }

    /// Directory holding the uploads of one session
    pub fn session_upload_dir(&self, session_id: &str) -> PathBuf {
        self.upload_root.join(session_id)
    }

    /// Directory holding the persisted index of one session
    pub fn session_index_dir(&self, session_id: &str) -> PathBuf {
        self.index_root.join(session_id)
    }

    /// Transcript file of one session
    pub fn transcript_path(&self, session_id: &str) -> PathBuf {
        self.session_root
            .join(format!("{}.{}", session_id, TRANSCRIPT_EXTENSION))
    }

    /// Write an uploaded file into the session's upload directory
    ///
    /// Only the final component of the supplied name is used. A file with
    /// the same name is overwritten.
    ///
    /// # Errors
    ///
    /// Returns error if the name has no usable file name component or the
    /// write fails
    pub fn store_upload(&self, session_id: &str, file: &UploadedFile) -> Result<PathBuf> {
        let file_name = Path::new(&file.name)
            .file_name()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ChatterError::Session(format!("Invalid upload file name: {:?}", file.name))
            })?;

        let dir = self.session_upload_dir(session_id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;

        let path = dir.join(file_name);
        fs::write(&path, &file.bytes)
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        tracing::debug!(
            "Stored upload {} ({} bytes) for session {}",
            path.display(),
            file.bytes.len(),
            session_id
        );
        Ok(path)
    }

    /// List every session identifier found in any of the three roots
    ///
    /// Sessions are ordered by transcript update time, most recent first;
    /// sessions without a transcript come last, ordered by identifier.
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let mut sessions: BTreeMap<String, SessionSummary> = BTreeMap::new();

        for id in subdirectory_names(&self.index_root)? {
            entry(&mut sessions, &id).has_index = true;
        }

        for id in subdirectory_names(&self.upload_root)? {
            let count = WalkDir::new(self.session_upload_dir(&id))
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .count();
            entry(&mut sessions, &id).upload_count = count;
        }

        if self.session_root.is_dir() {
            for dir_entry in fs::read_dir(&self.session_root)? {
                let path = dir_entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(TRANSCRIPT_EXTENSION) {
                    continue;
                }
                let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };

                let message_count = fs::read_to_string(&path)
                    .ok()
                    .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
                    .and_then(|v| v.get("chat_history").and_then(|h| h.as_array()).map(Vec::len))
                    .unwrap_or(0);
                let updated_at = fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .ok()
                    .map(DateTime::<Utc>::from);

                let summary = entry(&mut sessions, id);
                summary.message_count = message_count;
                summary.updated_at = updated_at;
            }
        }

        let mut sessions: Vec<SessionSummary> = sessions.into_values().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(sessions)
    }
}

fn entry<'a>(sessions: &'a mut BTreeMap<String, SessionSummary>, id: &str) -> &'a mut SessionSummary {
    sessions
        .entry(id.to_string())
        .or_insert_with(|| SessionSummary {
            id: id.to_string(),
            message_count: 0,
            upload_count: 0,
            has_index: false,
            updated_at: None,
        })
}

/// Names of the immediate subdirectories of `dir`, empty if it does not exist
pub(crate) fn subdirectory_names(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for dir_entry in fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_dir() {
            continue;
        }
        match dir_entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => tracing::warn!("Skipping non UTF-8 directory name {:?}", raw),
        }
    }
    names.sort();
    Ok(names)
}
