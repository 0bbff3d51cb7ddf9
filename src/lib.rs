//! PDF Chatter - session-scoped document chat library
//!
//! This library provides the core of a PDF chatbot: per-session storage of
//! uploaded documents, a registry of multimodal retrieval indexes, chat
//! transcripts persisted as JSON, and the interaction cycle tying them
//! together.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: On-disk layout for uploads, indexes and transcripts
//! - `session`: Session identifiers and session reset
//! - `index`: Registry of loaded retrieval indexes
//! - `transcript`: Chat transcript model and persistence
//! - `interaction`: One interaction cycle per user action
//! - `providers`: Indexing, retrieval and response generation backends
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use pdf_chatter::commands::Runtime;
//! use pdf_chatter::interaction::Interaction;
//! use pdf_chatter::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = Runtime::start(Config::default()).await?;
//!     let handler = runtime.handler(None)?;
//!     let report = handler
//!         .handle(Interaction::SendQuery("What is the summary?".to_string()))
//!         .await?;
//!     println!("{:?}", report.outcome);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod index;
pub mod interaction;
pub mod providers;
pub mod session;
pub mod storage;
pub mod transcript;

// Re-export commonly used types
pub use config::Config;
pub use error::{ChatterError, Result};
pub use index::IndexRegistry;
pub use interaction::{Interaction, InteractionHandler, InteractionOutcome};
pub use session::SessionIdentity;
pub use storage::StorageLayout;
pub use transcript::{Transcript, TranscriptStore};

#[cfg(test)]
pub mod test_utils;
