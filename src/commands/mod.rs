/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`   - Interactive chat REPL
- `index`  - Upload files into a session and build its index
- `query`  - Run a single query cycle
- `reset`  - Reset a session
- `history` - List sessions and show transcripts

Every handler starts from [`Runtime::start`], which prepares the storage
layout and registers every index already on disk.
*/

use crate::config::Config;
use crate::error::{ChatterError, Result};
use crate::index::IndexRegistry;
use crate::interaction::{InteractionHandler, InteractionOutcome};
use crate::providers::{create_backends, Backends};
use crate::session::SessionIdentity;
use crate::storage::{StorageLayout, UploadedFile};
use crate::transcript::Transcript;
use anyhow::Context;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Session history listing
pub mod history;

// Special commands parser for the chat REPL
pub mod special_commands;

/// Process-wide state shared by every command
pub struct Runtime {
    pub config: Config,
    pub layout: StorageLayout,
    pub backends: Backends,
    pub registry: Arc<IndexRegistry>,
}

impl Runtime {
    /// Prepare storage, create backends and load every persisted index
    ///
    /// # Errors
    ///
    /// Returns error if the storage layout cannot be created or the backends
    /// cannot be constructed. Individual index load failures are only logged.
    pub async fn start(config: Config) -> Result<Self> {
        let layout = StorageLayout::from_config(&config.storage);
        layout.ensure_layout()?;

        let backends = create_backends(&config)?;
        let registry = Arc::new(IndexRegistry::new(
            layout.index_root(),
            backends.indexer.clone(),
        ));
        let loaded = registry.load_all_existing().await;
        tracing::info!("Registered {} existing index(es)", loaded);

        Ok(Self {
            config,
            layout,
            backends,
            registry,
        })
    }

    /// Create an interaction handler for one client context
    ///
    /// With `session` the handler continues that session; otherwise a new
    /// identifier is minted on first use.
    ///
    /// # Errors
    ///
    /// Returns error if `session` is not a valid identifier
    pub fn handler(&self, session: Option<String>) -> Result<InteractionHandler> {
        let identity = match session {
            Some(id) => SessionIdentity::with_session(id)?,
            None => SessionIdentity::new(),
        };
        Ok(InteractionHandler::from_backends(
            self.layout.clone(),
            Arc::new(identity),
            self.registry.clone(),
            &self.backends,
        ))
    }
}

/// Read files from disk as uploads named after their final path component
///
/// # Errors
///
/// Returns error if any file cannot be read
pub fn read_uploads(paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    paths
        .iter()
        .map(|path| -> Result<UploadedFile> {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(UploadedFile::new(upload_name(path), bytes))
        })
        .collect()
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Render a transcript as `User:` / `Assistant:` lines
///
/// # Examples
///
/// ```
/// use pdf_chatter::commands::render_transcript;
/// use pdf_chatter::transcript::Transcript;
///
/// let mut transcript = Transcript::new();
/// transcript.push_turn("Hi", "Hello!");
/// assert_eq!(render_transcript(&transcript), "User: Hi\nAssistant: Hello!");
/// ```
pub fn render_transcript(transcript: &Transcript) -> String {
    transcript
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_transcript(transcript: &Transcript) {
    if transcript.is_empty() {
        return;
    }
    println!("\n{}", "Chat History".bold());
    for message in transcript {
        let label = format!("{}:", message.role);
        let label = match message.role {
            crate::transcript::Role::User => label.cyan().bold(),
            crate::transcript::Role::Assistant => label.green().bold(),
        };
        println!("{} {}", label, message.content);
    }
    println!();
}

fn print_outcome(outcome: &InteractionOutcome) {
    if let InteractionOutcome::Answered { answer } = outcome {
        println!("\n{}\n", answer);
        return;
    }
    let Some(message) = outcome.message() else {
        return;
    };
    match outcome {
        InteractionOutcome::IndexFailed(_) | InteractionOutcome::QueryFailed(_) => {
            eprintln!("{}", message.red())
        }
        _ if outcome.is_problem() => println!("{}", message.yellow()),
        _ => println!("{}", message.green()),
    }
}

/// Convert a failed one-shot outcome into an error for a non-zero exit
fn outcome_error(session_id: &str, outcome: &InteractionOutcome) -> Option<anyhow::Error> {
    let err = match outcome {
        InteractionOutcome::IndexFailed(msg) => ChatterError::IndexBuild(msg.clone()),
        InteractionOutcome::QueryFailed(msg) => ChatterError::Generation(msg.clone()),
        InteractionOutcome::NoIndexLoaded => ChatterError::IndexNotLoaded(session_id.to_string()),
        InteractionOutcome::NoFilesUploaded | InteractionOutcome::EmptyQuery => {
            ChatterError::Session(outcome.message().unwrap_or_default())
        }
        _ => return None,
    };
    Some(err.into())
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Runs a readline loop in which plain lines are questions and `/`
    //! lines are session commands. Each line drives one interaction cycle.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::interaction::Interaction;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat mode
    ///
    /// # Errors
    ///
    /// Returns error if startup fails or the terminal cannot be initialized.
    /// Errors inside the loop are printed and the loop continues.
    pub async fn run_chat(config: Config, session: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let runtime = Runtime::start(config).await?;
        let handler = runtime.handler(session)?;
        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&handler.session_id());

        // Show whatever the session already holds, as the first cycle
        match handler.handle(Interaction::ShowTranscript).await {
            Ok(report) => print_transcript(&report.transcript),
            Err(e) => eprintln!("{}", format!("Error: {:#}", e).red()),
        }

        loop {
            let prompt = format!("{} ", "pdf-chatter>".cyan().bold());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    };

                    let interaction = match command {
                        SpecialCommand::Index(paths) => match read_uploads(&paths) {
                            Ok(files) => Interaction::IndexFiles(files),
                            Err(e) => {
                                eprintln!("{}", format!("Error: {:#}", e).red());
                                continue;
                            }
                        },
                        SpecialCommand::Reset => Interaction::Reset,
                        SpecialCommand::History => Interaction::ShowTranscript,
                        SpecialCommand::Session => {
                            println!("Session: {}", handler.session_id().cyan());
                            continue;
                        }
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            rl.add_history_entry(trimmed)?;
                            Interaction::SendQuery(trimmed.to_string())
                        }
                    };

                    let show_transcript = matches!(interaction, Interaction::ShowTranscript);
                    match handler.handle(interaction).await {
                        Ok(report) => {
                            print_outcome(&report.outcome);
                            if show_transcript {
                                if report.transcript.is_empty() {
                                    println!("{}", "No messages yet.".yellow());
                                }
                                print_transcript(&report.transcript);
                            }
                        }
                        Err(e) => {
                            eprintln!("{}", format!("Error: {:#}", e).red());
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome_banner(session_id: &str) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║           PDF Chatter Interactive Mode - Welcome!            ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Session: {}\n", session_id.cyan());
        println!("Type '/index <files>' to add documents, '/help' for commands, 'exit' to quit\n");
    }
}

// One-shot index command
pub mod index {
    use super::*;
    use crate::interaction::Interaction;

    /// Upload `files` into a session and rebuild its index
    ///
    /// Prints the session identifier so later commands can continue it.
    ///
    /// # Errors
    ///
    /// Returns error if a file cannot be read or indexing fails
    pub async fn run_index(
        config: Config,
        session: Option<String>,
        files: Vec<PathBuf>,
    ) -> Result<()> {
        let runtime = Runtime::start(config).await?;
        let handler = runtime.handler(session)?;

        let uploads = read_uploads(&files)?;
        let report = handler.handle(Interaction::IndexFiles(uploads)).await?;

        println!("Session: {}", report.session_id);
        if let Some(err) = outcome_error(&report.session_id, &report.outcome) {
            return Err(err);
        }
        print_outcome(&report.outcome);
        Ok(())
    }
}

// One-shot query command
pub mod query {
    use super::*;
    use crate::interaction::Interaction;

    /// Run one query cycle and print the resulting transcript
    ///
    /// # Errors
    ///
    /// Returns error if the session has no index or the query fails
    pub async fn run_query(config: Config, session: Option<String>, text: String) -> Result<()> {
        let runtime = Runtime::start(config).await?;
        let handler = runtime.handler(session)?;

        let report = handler.handle(Interaction::SendQuery(text)).await?;
        if let Some(err) = outcome_error(&report.session_id, &report.outcome) {
            return Err(err);
        }
        print_transcript(&report.transcript);
        Ok(())
    }
}

// Reset command
pub mod reset {
    use super::*;
    use crate::interaction::Interaction;

    /// Reset `session` and print the identifier that replaces it
    ///
    /// # Errors
    ///
    /// Returns error if the identifier is invalid or a deletion fails
    pub async fn run_reset(config: Config, session: String) -> Result<()> {
        let runtime = Runtime::start(config).await?;
        let handler = runtime.handler(Some(session))?;

        let report = handler.handle(Interaction::Reset).await?;
        print_outcome(&report.outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_render_transcript_empty() {
        assert_eq!(render_transcript(&Transcript::new()), "");
    }

    #[test]
    fn test_render_transcript_orders_turns() {
        let mut transcript = Transcript::new();
        transcript.push_turn("q1", "a1");
        transcript.push_turn("q2", "a2");
        assert_eq!(
            render_transcript(&transcript),
            "User: q1\nAssistant: a1\nUser: q2\nAssistant: a2"
        );
    }

    #[test]
    fn test_read_uploads_uses_file_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let uploads = read_uploads(&[path]).unwrap();
        assert_eq!(uploads, vec![UploadedFile::new("report.pdf", b"%PDF".to_vec())]);
    }

    #[test]
    fn test_read_uploads_missing_file() {
        let err = read_uploads(&[PathBuf::from("/nonexistent/doc.pdf")]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/doc.pdf"));
    }

    #[test]
    fn test_outcome_error_only_for_failures() {
        assert!(outcome_error("S1", &InteractionOutcome::Displayed).is_none());
        assert!(outcome_error(
            "S1",
            &InteractionOutcome::Answered {
                answer: "a".to_string()
            }
        )
        .is_none());

        let err = outcome_error("S1", &InteractionOutcome::NoIndexLoaded).unwrap();
        assert!(matches!(
            err.downcast_ref::<ChatterError>(),
            Some(ChatterError::IndexNotLoaded(id)) if id == "S1"
        ));
    }

    #[tokio::test]
    async fn test_runtime_start_creates_layout() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.root = dir.path().to_path_buf();

        let runtime = Runtime::start(config).await.unwrap();

        assert!(runtime.layout.upload_root().is_dir());
        assert!(runtime.layout.index_root().is_dir());
        assert!(runtime.layout.session_root().is_dir());
        assert!(runtime.registry.registered_sessions().is_empty());
    }

    #[tokio::test]
    async fn test_runtime_handler_rejects_invalid_session() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.root = dir.path().to_path_buf();

        let runtime = Runtime::start(config).await.unwrap();
        assert!(runtime.handler(Some("../escape".to_string())).is_err());
        assert!(runtime.handler(Some("S1".to_string())).is_ok());
    }
}
