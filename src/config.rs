//! Configuration management for PDF Chatter
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatterError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for PDF Chatter
///
/// Holds the on-disk layout, the external indexing bridge, retrieval
/// settings, and the language-model responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// On-disk layout for uploads, indexes and transcripts
    #[serde(default)]
    pub storage: StorageConfig,

    /// External indexing/retrieval bridge
    #[serde(default)]
    pub indexer: IndexerConfig,

    /// Retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Response generation settings
    #[serde(default)]
    pub responder: ResponderConfig,
}

/// Storage layout configuration
///
/// The three directories are resolved relative to `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Working root that contains all three directories
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Directory holding per-session uploaded files
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Directory holding per-session persisted indexes
    #[serde(default = "default_index_dir")]
    pub index_dir: String,

    /// Directory holding per-session chat transcripts
    #[serde(default = "default_session_dir")]
    pub session_dir: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_upload_dir() -> String {
    "uploaded_documents".to_string()
}

fn default_index_dir() -> String {
    ".byaldi".to_string()
}

fn default_session_dir() -> String {
    "sessions".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            upload_dir: default_upload_dir(),
            index_dir: default_index_dir(),
            session_dir: default_session_dir(),
        }
    }
}

/// Indexing bridge configuration
///
/// The bridge is an external executable that wraps the multimodal retrieval
/// library. It is not part of this crate; the default names a Python module
/// the deployment is expected to install. See [`crate::providers::process`]
/// and `config/config.yaml` for its command protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Executable to run
    #[serde(default = "default_bridge_command")]
    pub command: String,

    /// Arguments placed before the bridge subcommand
    #[serde(default = "default_bridge_args")]
    pub args: Vec<String>,

    /// Optional limit on a single bridge invocation (seconds).
    /// `None` waits indefinitely.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_bridge_command() -> String {
    "python3".to_string()
}

fn default_bridge_args() -> Vec<String> {
    vec!["-m".to_string(), "pdf_chatter_bridge".to_string()]
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            command: default_bridge_command(),
            args: default_bridge_args(),
            timeout_seconds: None,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of pages requested per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

/// Responder configuration
///
/// Specifies which language-model backend answers queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Type of responder to use
    #[serde(rename = "type", default = "default_responder_type")]
    pub responder_type: String,

    /// Maximum number of page images attached to a single request
    #[serde(default = "default_max_images")]
    pub max_images: usize,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_responder_type() -> String {
    "ollama".to_string()
}

fn default_max_images() -> usize {
    3
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            responder_type: default_responder_type(),
            max_images: default_max_images(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// Ollama responder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Vision-capable model to use
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llava:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatterError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatterError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(root) = std::env::var("PDF_CHATTER_ROOT") {
            self.storage.root = PathBuf::from(root);
        }

        if let Ok(command) = std::env::var("PDF_CHATTER_BRIDGE_COMMAND") {
            self.indexer.command = command;
        }

        if let Ok(top_k) = std::env::var("PDF_CHATTER_TOP_K") {
            if let Ok(value) = top_k.parse() {
                self.retrieval.top_k = value;
            } else {
                tracing::warn!("Invalid PDF_CHATTER_TOP_K: {}", top_k);
            }
        }

        if let Ok(ollama_host) = std::env::var("PDF_CHATTER_OLLAMA_HOST") {
            self.responder.ollama.host = ollama_host;
        }

        if let Ok(ollama_model) = std::env::var("PDF_CHATTER_OLLAMA_MODEL") {
            self.responder.ollama.model = ollama_model;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(root) = &cli.root {
            tracing::debug!("Using data root override from CLI: {}", root.display());
            self.storage.root = root.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let dirs = [
            ("storage.upload_dir", &self.storage.upload_dir),
            ("storage.index_dir", &self.storage.index_dir),
            ("storage.session_dir", &self.storage.session_dir),
        ];
        for (field, value) in dirs {
            if value.trim().is_empty() {
                return Err(ChatterError::Config(format!("{} cannot be empty", field)).into());
            }
        }

        if self.storage.upload_dir == self.storage.index_dir
            || self.storage.upload_dir == self.storage.session_dir
            || self.storage.index_dir == self.storage.session_dir
        {
            return Err(ChatterError::Config(
                "storage directories must be distinct".to_string(),
            )
            .into());
        }

        if self.indexer.command.trim().is_empty() {
            return Err(
                ChatterError::Config("indexer.command cannot be empty".to_string()).into(),
            );
        }

        if self.indexer.timeout_seconds == Some(0) {
            return Err(ChatterError::Config(
                "indexer.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.retrieval.top_k == 0 {
            return Err(
                ChatterError::Config("retrieval.top_k must be greater than 0".to_string()).into(),
            );
        }

        let valid_responders = ["ollama"];
        if !valid_responders.contains(&self.responder.responder_type.as_str()) {
            return Err(ChatterError::Config(format!(
                "Invalid responder type: {}. Must be one of: {}",
                self.responder.responder_type,
                valid_responders.join(", ")
            ))
            .into());
        }

        if self.responder.max_images == 0 {
            return Err(ChatterError::Config(
                "responder.max_images must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            indexer: IndexerConfig::default(),
            retrieval: RetrievalConfig::default(),
            responder: ResponderConfig::default(),
        }
    }
}
