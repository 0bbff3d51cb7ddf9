//! PDF Chatter - chat with your PDF documents
//!
//! Main entry point for the pdf-chatter command-line application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pdf_chatter::cli::{Cli, Commands};
use pdf_chatter::commands;
use pdf_chatter::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config = Config::load(&cli.config, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { session } => {
            if let Some(id) = &session {
                tracing::debug!("Continuing session: {}", id);
            }
            commands::chat::run_chat(config, session).await?;
            Ok(())
        }
        Commands::Index { session, files } => {
            tracing::info!("Indexing {} file(s)", files.len());
            commands::index::run_index(config, session, files).await?;
            Ok(())
        }
        Commands::Query { session, text } => {
            commands::query::run_query(config, session, text).await?;
            Ok(())
        }
        Commands::Reset { session } => {
            tracing::info!("Resetting session {}", session);
            commands::reset::run_reset(config, session).await?;
            Ok(())
        }
        Commands::History { command } => {
            let runtime = commands::Runtime::start(config).await?;
            commands::history::handle_history(&runtime, command)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "pdf_chatter=debug"
    } else {
        "pdf_chatter=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
