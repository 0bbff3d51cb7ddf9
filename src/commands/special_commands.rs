//! Special commands parser for interactive chat mode
//!
//! Lines starting with `/` are session commands rather than questions:
//! uploading and indexing files, resetting the session, showing the
//! transcript or the session identifier, help and exit.
//!
//! Command names are case-insensitive. Arguments keep their original case.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Upload the given files and rebuild the session's index
    Index(Vec<PathBuf>),

    /// Discard the transcript and uploads and start a new session
    Reset,

    /// Print the session transcript
    History,

    /// Print the current session identifier
    Session,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent as a query.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns [`CommandError::UnknownCommand`] for an unrecognized `/` command,
/// [`CommandError::MissingArgument`] for `/index` without paths and
/// [`CommandError::UnsupportedArgument`] when an argument-less command is
/// given one.
///
/// # Examples
///
/// ```
/// use pdf_chatter::commands::special_commands::{parse_special_command, SpecialCommand};
/// use std::path::PathBuf;
///
/// let cmd = parse_special_command("/index report.pdf").unwrap();
/// assert_eq!(cmd, SpecialCommand::Index(vec![PathBuf::from("report.pdf")]));
///
/// let cmd = parse_special_command("What is the summary?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // Bare exit/quit also leave the session
    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    let no_argument = |command: SpecialCommand| {
        if rest.is_empty() {
            Ok(command)
        } else {
            Err(CommandError::UnsupportedArgument {
                command: name.clone(),
                arg: rest.to_string(),
            })
        }
    };

    match name.as_str() {
        "/index" | "/upload" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "/index".to_string(),
                    usage: "/index <file> [file...]".to_string(),
                });
            }
            Ok(SpecialCommand::Index(
                rest.split_whitespace().map(PathBuf::from).collect(),
            ))
        }
        "/reset" => no_argument(SpecialCommand::Reset),
        "/history" => no_argument(SpecialCommand::History),
        "/session" => no_argument(SpecialCommand::Session),
        "/help" | "/?" => no_argument(SpecialCommand::Help),
        "/exit" | "/quit" => no_argument(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Display help information for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

DOCUMENTS:
  /index <files...>  - Upload files and rebuild this session's index
  /upload <files...> - Same as /index

SESSION:
  /history        - Show the chat transcript
  /session        - Show the current session identifier
  /reset          - Delete transcript and uploads, start a new session

SESSION CONTROL:
  /help           - Show this help message
  /?              - Same as /help
  /exit, exit     - Exit interactive mode
  /quit, quit     - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent as a question
  - File paths are separated by whitespace
  - /reset keeps the index on disk under the old session identifier
"#
    );
}
