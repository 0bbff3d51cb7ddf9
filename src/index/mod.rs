//! Index lifecycle management
//!
//! The [`IndexRegistry`] maps session identifiers to loaded index handles.
//! Handles are registered by a startup scan of the index root, lazily when a
//! session's index directory exists but was never loaded, and whenever a
//! session's index is rebuilt.

use crate::error::{ChatterError, Result};
use crate::providers::{DocumentIndexer, IndexHandle};
use crate::storage::subdirectory_names;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Shared registry of loaded retrieval indexes
///
/// At most one handle is registered per session identifier. The map lock is
/// never held across a backend call.
pub struct IndexRegistry {
    index_root: PathBuf,
    indexer: Arc<dyn DocumentIndexer>,
    handles: RwLock<HashMap<String, IndexHandle>>,
}

impl IndexRegistry {
    /// Create an empty registry over `index_root`
    pub fn new(index_root: impl Into<PathBuf>, indexer: Arc<dyn DocumentIndexer>) -> Self {
        Self {
            index_root: index_root.into(),
            indexer,
            handles: RwLock::new(HashMap::new()),
        }
    }

    pub fn index_root(&self) -> &Path {
        &self.index_root
    }

    /// Directory where the index of `session_id` is persisted
    pub fn index_path(&self, session_id: &str) -> PathBuf {
        self.index_root.join(session_id)
    }

    /// Load every persisted index found under the index root
    ///
    /// Each subdirectory is loaded and registered under its directory name.
    /// A directory that fails to load is logged and skipped. Returns the
    /// number of handles registered.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_chatter::config::IndexerConfig;
    /// use pdf_chatter::index::IndexRegistry;
    /// use pdf_chatter::providers::ProcessBridge;
    /// use std::sync::Arc;
    ///
    /// # tokio_test::block_on(async {
    /// let bridge = Arc::new(ProcessBridge::new(&IndexerConfig::default(), 3));
    /// let registry = IndexRegistry::new("/nonexistent/.byaldi", bridge);
    /// assert_eq!(registry.load_all_existing().await, 0);
    /// assert!(registry.get("S1").is_none());
    /// # });
    /// ```
    pub async fn load_all_existing(&self) -> usize {
        let names = match subdirectory_names(&self.index_root) {
            Ok(names) => names,
            Err(e) => {
                tracing::error!(
                    "Failed to scan index root {}: {:#}",
                    self.index_root.display(),
                    e
                );
                return 0;
            }
        };

        let mut loaded = 0;
        for name in names {
            let path = self.index_path(&name);
            match self.indexer.load_index(&path).await {
                Ok(handle) => {
                    tracing::info!("Loaded existing index for session {}", name);
                    self.register(&name, handle);
                    loaded += 1;
                }
                Err(e) => {
                    tracing::error!("Error loading index for session {}: {:#}", name, e);
                }
            }
        }

        tracing::debug!("Startup scan registered {} index(es)", loaded);
        loaded
    }

    /// Register the persisted index of `session_id` if it exists but is not
    /// loaded yet
    ///
    /// Load failures are logged, not returned; the session then stays
    /// without a handle.
    pub async fn ensure_loaded(&self, session_id: &str) {
        if self.get(session_id).is_some() {
            return;
        }

        let path = self.index_path(session_id);
        if !path.is_dir() {
            return;
        }

        match self.indexer.load_index(&path).await {
            Ok(handle) => {
                tracing::info!("Loaded index for session {}", session_id);
                self.register(session_id, handle);
            }
            Err(e) => {
                tracing::error!("Error loading index for session {}: {:#}", session_id, e);
            }
        }
    }

    /// Build a fresh index over `document_folder` and register it
    ///
    /// The index is named after the session and persisted under
    /// `<index root>/<session_id>`, replacing any previous handle.
    ///
    /// # Errors
    ///
    /// Returns [`ChatterError::IndexBuild`] if the indexer produced no
    /// handle, or the indexer's own error if it failed outright
    pub async fn build_index(
        &self,
        session_id: &str,
        document_folder: &Path,
    ) -> Result<IndexHandle> {
        let index_path = self.index_path(session_id);
        tracing::info!(
            "Indexing {} for session {}",
            document_folder.display(),
            session_id
        );

        let handle = self
            .indexer
            .index_documents(document_folder, session_id, &index_path)
            .await?
            .ok_or_else(|| ChatterError::IndexBuild("Indexing failed.".to_string()))?;

        self.register(session_id, handle.clone());
        tracing::info!(
            "Indexed {} document(s) for session {}",
            handle.document_count,
            session_id
        );
        Ok(handle)
    }

    /// The handle registered for `session_id`, if any
    pub fn get(&self, session_id: &str) -> Option<IndexHandle> {
        self.handles
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(session_id)
            .cloned()
    }

    /// Identifiers with a registered handle, sorted
    pub fn registered_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .handles
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    fn register(&self, session_id: &str, handle: IndexHandle) {
        self.handles
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(session_id.to_string(), handle);
    }
}
