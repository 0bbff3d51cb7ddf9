//! External process bridge for indexing and retrieval
//!
//! The multimodal retrieval library runs outside this process. The bridge
//! invokes a configured executable once per operation and reads a single
//! JSON document from its stdout.
//!
//! # Protocol
//!
//! ```text
//! <command> <args..> index --input <folder> --name <name> --output <index_path>
//!     stdout: {"document_count": 3, "metadata": {...}}   or   null
//! <command> <args..> load --index <index_path>
//!     stdout: {"document_count": 3, "metadata": {...}}
//! <command> <args..> retrieve --index <index_path> --query <text> --top-k <k> --session <id>
//!     stdout: [{"doc_id": 0, "page_num": 1, "score": 12.3, "base64": "..."}, ...]
//! ```
//!
//! A non-zero exit status is an error; stderr is logged at `DEBUG` and
//! included in the error message.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::config::IndexerConfig;
use crate::error::{ChatterError, Result};
use crate::providers::{DocumentIndexer, DocumentRetriever, IndexHandle, RetrievedPage};

/// Index descriptor printed by the bridge
#[derive(Debug, Deserialize)]
struct IndexDescriptor {
    #[serde(default)]
    document_count: usize,
    #[serde(default)]
    metadata: serde_json::Value,
}

/// Bridge to an external indexing/retrieval executable
#[derive(Debug, Clone)]
pub struct ProcessBridge {
    command: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
    top_k: usize,
}

impl ProcessBridge {
    /// Create a bridge from the indexer configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_chatter::config::IndexerConfig;
    /// use pdf_chatter::providers::ProcessBridge;
    ///
    /// let bridge = ProcessBridge::new(&IndexerConfig::default(), 3);
    /// assert_eq!(bridge.top_k(), 3);
    /// ```
    pub fn new(config: &IndexerConfig, top_k: usize) -> Self {
        tracing::info!(
            "Initialized process bridge: command={}, args={:?}",
            config.command,
            config.args
        );
        Self {
            command: PathBuf::from(&config.command),
            args: config.args.clone(),
            timeout: config.timeout_seconds.map(Duration::from_secs),
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Run one bridge subcommand and return its trimmed stdout
    async fn run(&self, subcommand: &str, extra: Vec<String>) -> Result<String> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        cmd.arg(subcommand);
        cmd.args(&extra);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::debug!(
            "Running bridge: {} {:?} {} {:?}",
            self.command.display(),
            self.args,
            subcommand,
            extra
        );

        let child = cmd.spawn().map_err(|e| {
            ChatterError::Backend(format!(
                "failed to spawn bridge `{}`: {} (set indexer.command in the configuration)",
                self.command.display(),
                e
            ))
        })?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    ChatterError::Backend(format!(
                        "bridge `{}` timed out after {}s",
                        subcommand,
                        limit.as_secs()
                    ))
                })??,
            None => child.wait_with_output().await?,
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            tracing::debug!(target: "pdf_chatter::bridge", "{}", line);
        }

        if !output.status.success() {
            return Err(ChatterError::Backend(format!(
                "bridge `{}` exited with {}: {} (check indexer.command and indexer.args in the configuration)",
                subcommand,
                output.status,
                stderr.trim()
            ))
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn parse_descriptor(stdout: &str) -> Result<Option<IndexDescriptor>> {
    serde_json::from_str::<Option<IndexDescriptor>>(stdout).map_err(|e| {
        ChatterError::Backend(format!("unexpected bridge output {:?}: {}", stdout, e)).into()
    })
}

fn handle_from(descriptor: IndexDescriptor, name: &str, path: &Path) -> IndexHandle {
    IndexHandle {
        name: name.to_string(),
        path: path.to_path_buf(),
        document_count: descriptor.document_count,
        metadata: descriptor.metadata,
    }
}

#[async_trait]
impl DocumentIndexer for ProcessBridge {
    async fn index_documents(
        &self,
        document_folder: &Path,
        index_name: &str,
        index_path: &Path,
    ) -> Result<Option<IndexHandle>> {
        let stdout = self
            .run(
                "index",
                vec![
                    "--input".to_string(),
                    path_arg(document_folder),
                    "--name".to_string(),
                    index_name.to_string(),
                    "--output".to_string(),
                    path_arg(index_path),
                ],
            )
            .await?;

        Ok(parse_descriptor(&stdout)?.map(|d| handle_from(d, index_name, index_path)))
    }

    async fn load_index(&self, index_path: &Path) -> Result<IndexHandle> {
        let stdout = self
            .run("load", vec!["--index".to_string(), path_arg(index_path)])
            .await?;

        let name = index_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        parse_descriptor(&stdout)?
            .map(|d| handle_from(d, &name, index_path))
            .ok_or_else(|| {
                ChatterError::IndexLoad(format!(
                    "bridge reported no index at {}",
                    index_path.display()
                ))
                .into()
            })
    }
}

#[async_trait]
impl DocumentRetriever for ProcessBridge {
    async fn retrieve_documents(
        &self,
        index: &IndexHandle,
        query: &str,
        session_id: &str,
    ) -> Result<Vec<RetrievedPage>> {
        let stdout = self
            .run(
                "retrieve",
                vec![
                    "--index".to_string(),
                    path_arg(&index.path),
                    "--query".to_string(),
                    query.to_string(),
                    "--top-k".to_string(),
                    self.top_k.to_string(),
                    "--session".to_string(),
                    session_id.to_string(),
                ],
            )
            .await?;

        let pages: Vec<RetrievedPage> = serde_json::from_str(&stdout).map_err(|e| {
            ChatterError::Retrieval(format!("unexpected bridge output {:?}: {}", stdout, e))
        })?;

        tracing::debug!(
            "Retrieved {} pages for session {}",
            pages.len(),
            session_id
        );
        Ok(pages)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Write a shell script that acts as the bridge, run through `/bin/sh`
    fn script_bridge(dir: &TempDir, body: &str) -> ProcessBridge {
        let path = dir.path().join("bridge.sh");
        std::fs::write(&path, format!("{}\n", body)).unwrap();

        let config = IndexerConfig {
            command: "/bin/sh".to_string(),
            args: vec![path.to_string_lossy().to_string()],
            timeout_seconds: None,
        };
        ProcessBridge::new(&config, 2)
    }

    #[tokio::test]
    async fn test_index_documents_parses_descriptor() {
        let dir = TempDir::new().unwrap();
        let bridge = script_bridge(
            &dir,
            r#"[ "$1" = "index" ] || exit 9
echo '{"document_count": 4, "metadata": {"model": "colpali"}}'"#,
        );

        let handle = bridge
            .index_documents(Path::new("/docs/S1"), "S1", Path::new("/idx/S1"))
            .await
            .unwrap()
            .expect("handle");

        assert_eq!(handle.name, "S1");
        assert_eq!(handle.path, PathBuf::from("/idx/S1"));
        assert_eq!(handle.document_count, 4);
        assert_eq!(handle.metadata["model"], "colpali");
    }

    #[tokio::test]
    async fn test_index_documents_null_means_no_handle() {
        let dir = TempDir::new().unwrap();
        let bridge = script_bridge(&dir, "echo null");

        let result = bridge
            .index_documents(Path::new("/docs"), "S1", Path::new("/idx/S1"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_load_index_names_handle_after_directory() {
        let dir = TempDir::new().unwrap();
        let bridge = script_bridge(&dir, r#"echo '{"document_count": 1}'"#);

        let handle = bridge.load_index(Path::new("/idx/abc")).await.unwrap();
        assert_eq!(handle.name, "abc");
        assert_eq!(handle.document_count, 1);
    }

    #[tokio::test]
    async fn test_load_index_null_is_error() {
        let dir = TempDir::new().unwrap();
        let bridge = script_bridge(&dir, "echo null");

        assert!(bridge.load_index(Path::new("/idx/abc")).await.is_err());
    }

    #[tokio::test]
    async fn test_retrieve_passes_arguments_and_parses_pages() {
        let dir = TempDir::new().unwrap();
        // Echo back the query and top-k through the page fields.
        let bridge = script_bridge(
            &dir,
            r#"[ "$1" = "retrieve" ] || exit 9
[ "$5" = "What is the summary?" ] || exit 8
echo "[{\"doc_id\": 0, \"page_num\": $7, \"score\": 1.5}]""#,
        );

        let pages = bridge
            .retrieve_documents(
                &IndexHandle::new("S1", "/idx/S1"),
                "What is the summary?",
                "S1",
            )
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_num, 2);
    }

    #[tokio::test]
    async fn test_non_zero_exit_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let bridge = script_bridge(&dir, "echo 'model weights missing' >&2\nexit 3");

        let err = bridge
            .load_index(Path::new("/idx/S1"))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("model weights missing"), "{}", err);
    }

    #[tokio::test]
    async fn test_garbage_output_is_error() {
        let dir = TempDir::new().unwrap();
        let bridge = script_bridge(&dir, "echo 'Indexing 3 files...'");

        let result = bridge
            .index_documents(Path::new("/docs"), "S1", Path::new("/idx/S1"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_executable_is_error() {
        let config = IndexerConfig {
            command: "/nonexistent/bridge".to_string(),
            args: vec![],
            timeout_seconds: None,
        };
        let bridge = ProcessBridge::new(&config, 1);

        let err = bridge.load_index(Path::new("/idx/S1")).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("failed to spawn bridge"));
        assert!(message.contains("indexer.command"), "{}", message);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut bridge = script_bridge(&dir, "sleep 5\necho null");
        bridge.timeout = Some(Duration::from_millis(100));

        let err = bridge.load_index(Path::new("/idx/S1")).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
