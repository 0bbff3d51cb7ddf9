use crate::cli::HistoryCommand;
use crate::commands::{render_transcript, Runtime};
use crate::error::Result;
use crate::session::validate_session_id;
use crate::storage::SessionSummary;
use crate::transcript::TranscriptStore;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub fn handle_history(runtime: &Runtime, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List => {
            let sessions = runtime.layout.list_sessions()?;

            if sessions.is_empty() {
                println!("{}", "No sessions found.".yellow());
                return Ok(());
            }

            let registered = runtime.registry.registered_sessions();
            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Messages".bold(),
                "Uploads".bold(),
                "Index".bold(),
                "Last Updated".bold()
            ]);

            for session in sessions {
                let index = index_status(&session, registered.contains(&session.id));
                let updated = session
                    .updated_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());

                table.add_row(prettytable::row![
                    session.id.cyan(),
                    session.message_count,
                    session.upload_count,
                    index,
                    updated
                ]);
            }

            println!("\nSessions:");
            table.printstd();
            println!();
            println!(
                "Use {} to continue a session.",
                "pdf-chatter chat --session <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id } => {
            validate_session_id(&id)?;
            let transcript = TranscriptStore::new(runtime.layout.clone()).load(&id)?;

            if transcript.is_empty() {
                println!("{}", format!("No messages for session {}.", id).yellow());
            } else {
                println!("{}", render_transcript(&transcript));
            }
        }
    }

    Ok(())
}

fn index_status(session: &SessionSummary, registered: bool) -> &'static str {
    match (session.has_index, registered) {
        (_, true) => "loaded",
        (true, false) => "on disk",
        (false, false) => "-",
    }
}
