use async_trait::async_trait;
use pdf_chatter::error::Result;
use pdf_chatter::providers::{
    DocumentIndexer, DocumentRetriever, GeneratedResponse, IndexHandle, ResponseGenerator,
    RetrievedPage,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Indexer that persists the document count as `index.json`
#[allow(dead_code)]
#[derive(Default)]
pub struct MarkerIndexer;

#[async_trait]
impl DocumentIndexer for MarkerIndexer {
    async fn index_documents(
        &self,
        document_folder: &Path,
        index_name: &str,
        index_path: &Path,
    ) -> Result<Option<IndexHandle>> {
        let count = fs::read_dir(document_folder)?.count();
        fs::create_dir_all(index_path)?;
        fs::write(
            index_path.join("index.json"),
            format!("{{\"document_count\": {}}}", count),
        )?;

        let mut handle = IndexHandle::new(index_name, index_path);
        handle.document_count = count;
        Ok(Some(handle))
    }

    async fn load_index(&self, index_path: &Path) -> Result<IndexHandle> {
        let raw = fs::read_to_string(index_path.join("index.json"))?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        let name = index_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut handle = IndexHandle::new(name, index_path);
        handle.document_count = value["document_count"].as_u64().unwrap_or(0) as usize;
        Ok(handle)
    }
}

/// Retriever returning one page per call and counting calls
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingRetriever {
    pub calls: AtomicUsize,
}

#[async_trait]
impl DocumentRetriever for CountingRetriever {
    async fn retrieve_documents(
        &self,
        index: &IndexHandle,
        _query: &str,
        _session_id: &str,
    ) -> Result<Vec<RetrievedPage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![RetrievedPage {
            doc_id: 0,
            page_num: index.document_count as u32,
            score: 1.0,
            base64: None,
            image_path: None,
        }])
    }
}

/// Responder answering with a fixed text
#[allow(dead_code)]
pub struct FixedResponder(pub &'static str);

#[async_trait]
impl ResponseGenerator for FixedResponder {
    async fn generate_response(
        &self,
        _pages: &[RetrievedPage],
        _query: &str,
        _session_id: &str,
    ) -> Result<GeneratedResponse> {
        Ok(GeneratedResponse::new(self.0))
    }
}

/// Shell script acting as the process bridge
///
/// `index` creates the output directory and reports one document, `load`
/// reports one document and `retrieve` returns a single page.
#[allow(dead_code)]
pub const BRIDGE_SCRIPT: &str = r#"case "$1" in
  index) mkdir -p "$7"; echo '{"document_count": 1}' ;;
  load) echo '{"document_count": 1}' ;;
  retrieve) echo '[{"doc_id": 0, "page_num": 1, "score": 1.0}]' ;;
  *) echo "unknown subcommand $1" >&2; exit 2 ;;
esac
"#;

/// Write the bridge script and a config that runs it through `/bin/sh`
#[allow(dead_code)]
pub fn bridge_config(dir: &Path) -> PathBuf {
    let script = dir.join("bridge.sh");
    fs::write(&script, BRIDGE_SCRIPT).expect("failed to write bridge script");

    let config_path = dir.join("config.yaml");
    fs::write(
        &config_path,
        format!(
            "indexer:\n  command: /bin/sh\n  args:\n    - {}\n",
            script.display()
        ),
    )
    .expect("failed to write config file");
    config_path
}
