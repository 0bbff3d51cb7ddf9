//! Test utilities for PDF Chatter
//!
//! This module provides a filesystem-backed fake indexer and small helpers
//! for building storage fixtures in temporary directories.

use crate::error::{ChatterError, Result};
use crate::providers::{DocumentIndexer, IndexHandle};
use crate::storage::StorageLayout;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Marker file the fake indexer writes into each index directory
pub const FAKE_INDEX_MARKER: &str = "index.json";

/// Indexer that persists a small JSON marker instead of a real index
///
/// `index_documents` counts the files in the document folder and writes the
/// count into `<index_path>/index.json`; `load_index` reads it back and
/// fails when the marker is missing.
#[derive(Debug, Default)]
pub struct FakeIndexer {
    yield_nothing: bool,
    fail_with: Option<String>,
}

impl FakeIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// An indexer that completes without producing a handle
    pub fn yielding_nothing() -> Self {
        Self {
            yield_nothing: true,
            fail_with: None,
        }
    }

    /// An indexer whose every call fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            yield_nothing: false,
            fail_with: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl DocumentIndexer for FakeIndexer {
    async fn index_documents(
        &self,
        document_folder: &Path,
        index_name: &str,
        index_path: &Path,
    ) -> Result<Option<IndexHandle>> {
        if let Some(message) = &self.fail_with {
            return Err(ChatterError::Backend(message.clone()).into());
        }
        if self.yield_nothing {
            return Ok(None);
        }

        let document_count = WalkDir::new(document_folder)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();

        std::fs::create_dir_all(index_path)?;
        std::fs::write(
            index_path.join(FAKE_INDEX_MARKER),
            serde_json::to_vec(&serde_json::json!({ "document_count": document_count }))?,
        )?;

        let mut handle = IndexHandle::new(index_name, index_path);
        handle.document_count = document_count;
        Ok(Some(handle))
    }

    async fn load_index(&self, index_path: &Path) -> Result<IndexHandle> {
        if let Some(message) = &self.fail_with {
            return Err(ChatterError::IndexLoad(message.clone()).into());
        }

        let marker = std::fs::read(index_path.join(FAKE_INDEX_MARKER)).map_err(|e| {
            ChatterError::IndexLoad(format!("{}: {}", index_path.display(), e))
        })?;
        let value: serde_json::Value = serde_json::from_slice(&marker)?;

        let name = index_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut handle = IndexHandle::new(name, index_path);
        handle.document_count = value["document_count"].as_u64().unwrap_or(0) as usize;
        Ok(handle)
    }
}

/// Create a temporary directory with the storage layout in place
///
/// # Panics
///
/// Panics if the directory or layout cannot be created
pub fn temp_layout() -> (TempDir, StorageLayout) {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let layout = StorageLayout::with_root(dir.path());
    layout.ensure_layout().expect("Failed to create storage layout");
    (dir, layout)
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_indexer_round_trip() {
        let (dir, layout) = temp_layout();
        create_test_file(&dir, "doc.pdf", b"%PDF");
        let index_path = layout.session_index_dir("S1");

        let handle = FakeIndexer::new()
            .index_documents(dir.path(), "S1", &index_path)
            .await
            .unwrap()
            .unwrap();
        let loaded = FakeIndexer::new().load_index(&index_path).await.unwrap();

        assert_eq!(loaded.name, handle.name);
        assert_eq!(loaded.document_count, handle.document_count);
    }

    #[tokio::test]
    async fn test_fake_indexer_load_without_marker_fails() {
        let (_dir, layout) = temp_layout();
        let result = FakeIndexer::new()
            .load_index(&layout.session_index_dir("missing"))
            .await;
        assert!(result.is_err());
    }
}
