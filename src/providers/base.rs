//! Backend traits and shared types
//!
//! Index construction, page retrieval and answer generation are delegated to
//! external systems. This module defines the seams they plug into.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// In-memory handle to a persisted retrieval index
///
/// The index artifact itself is owned by the indexing backend; the handle
/// records where it lives and whatever the backend reported about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHandle {
    /// Index name, equal to the owning session identifier
    pub name: String,
    /// Directory holding the persisted index
    pub path: PathBuf,
    /// Number of documents the backend reported as indexed
    #[serde(default)]
    pub document_count: usize,
    /// Backend-specific details, passed back on retrieval
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl IndexHandle {
    /// Creates a handle with no backend metadata
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_chatter::providers::IndexHandle;
    ///
    /// let handle = IndexHandle::new("S1", ".byaldi/S1");
    /// assert_eq!(handle.name, "S1");
    /// assert_eq!(handle.document_count, 0);
    /// ```
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            document_count: 0,
            metadata: serde_json::Value::Null,
        }
    }
}

/// A ranked page returned by retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPage {
    /// Backend document identifier
    #[serde(default)]
    pub doc_id: u64,
    /// Page number within the document
    #[serde(default)]
    pub page_num: u32,
    /// Relevance score, higher is better
    #[serde(default)]
    pub score: f32,
    /// Base64-encoded page image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    /// Path to a rendered page image, used when `base64` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
}

/// Details about a generated answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Model that produced the answer
    pub model: Option<String>,
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Number of page images sent with the query
    pub pages_used: usize,
}

/// Answer text plus metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResponse {
    pub text: String,
    pub metadata: ResponseMetadata,
}

impl GeneratedResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Builds and loads persisted retrieval indexes
#[async_trait]
pub trait DocumentIndexer: Send + Sync {
    /// Build an index over every document in `document_folder`
    ///
    /// The index is persisted under `index_path`, replacing any previous
    /// artifact there. `Ok(None)` means the backend finished without
    /// producing a usable index.
    ///
    /// # Errors
    ///
    /// Returns error if the backend could not be invoked or failed
    async fn index_documents(
        &self,
        document_folder: &Path,
        index_name: &str,
        index_path: &Path,
    ) -> Result<Option<IndexHandle>>;

    /// Load a previously persisted index
    ///
    /// # Errors
    ///
    /// Returns error if the directory does not hold a loadable index
    async fn load_index(&self, index_path: &Path) -> Result<IndexHandle>;
}

/// Finds the pages most relevant to a query
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Return pages ranked by relevance to `query`
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    async fn retrieve_documents(
        &self,
        index: &IndexHandle,
        query: &str,
        session_id: &str,
    ) -> Result<Vec<RetrievedPage>>;
}

/// Produces an answer grounded in retrieved pages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Answer `query` using `pages` as context
    ///
    /// # Errors
    ///
    /// Returns error if the model call fails
    async fn generate_response(
        &self,
        pages: &[RetrievedPage],
        query: &str,
        session_id: &str,
    ) -> Result<GeneratedResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_handle_deserializes_with_defaults() {
        let handle: IndexHandle =
            serde_json::from_str(r#"{"name":"S1","path":".byaldi/S1"}"#).unwrap();
        assert_eq!(handle, IndexHandle::new("S1", ".byaldi/S1"));
    }

    #[test]
    fn test_retrieved_page_parses_bridge_output() {
        let page: RetrievedPage = serde_json::from_str(
            r#"{"doc_id": 2, "page_num": 7, "score": 17.5, "base64": "aGVsbG8="}"#,
        )
        .unwrap();
        assert_eq!(page.doc_id, 2);
        assert_eq!(page.page_num, 7);
        assert_eq!(page.base64.as_deref(), Some("aGVsbG8="));
        assert!(page.image_path.is_none());
    }

    #[test]
    fn test_retrieved_page_skips_absent_image_fields() {
        let page = RetrievedPage {
            doc_id: 1,
            page_num: 1,
            score: 0.5,
            base64: None,
            image_path: None,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("base64").is_none());
        assert!(json.get("image_path").is_none());
    }

    #[test]
    fn test_generated_response_new_has_empty_metadata() {
        let response = GeneratedResponse::new("answer");
        assert_eq!(response.text, "answer");
        assert_eq!(response.metadata, ResponseMetadata::default());
    }
}
