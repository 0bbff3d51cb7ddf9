//! Command-line interface definition for PDF Chatter
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot indexing and queries,
//! session reset and transcript history.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PDF Chatter - chat with your PDF documents
///
/// Upload documents into a session, build a multimodal retrieval index over
/// them and ask questions answered from the retrieved pages.
#[derive(Parser, Debug, Clone)]
#[command(name = "pdf-chatter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "PDF_CHATTER_CONFIG", default_value = "config/config.yaml")]
    pub config: String,

    /// Data root holding uploads, indexes and transcripts
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for PDF Chatter
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Continue an existing session instead of starting a new one
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Upload files into a session and build its index
    Index {
        /// Session to index into; a new one is started if omitted
        #[arg(short, long)]
        session: Option<String>,

        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ask a single question against a session's index
    Query {
        /// Session to query
        #[arg(short, long)]
        session: Option<String>,

        /// Question text
        text: String,
    },

    /// Discard a session's transcript and uploads
    Reset {
        /// Session to reset
        #[arg(short, long)]
        session: String,
    },

    /// Inspect stored sessions
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// Session history subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List every session found on disk
    List,

    /// Print the transcript of a session
    Show {
        /// Session identifier
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
