//! Robert CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Interactive conversation on one session key
//! - `ask`: Single turn, prints the reply and exits
//! - `serve`: Start the HTTP gateway
//! - `version`: Print the version

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "robert",
    about = "Agent R.O.B.E.R.T. — tool-using LLM assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (JSON, or TOML by extension)
    #[arg(short, long, global = true, default_value = robert_config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the agent interactively
    Chat {
        /// Conversation key to continue
        #[arg(short, long, default_value = commands::CLI_SESSION)]
        session: String,
    },

    /// Send a single message and print the reply
    Ask {
        /// The message to send
        #[arg(short, long)]
        message: String,

        /// Conversation key to continue
        #[arg(short, long, default_value = commands::CLI_SESSION)]
        session: String,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // `.env` next to the config; real environment variables win.
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    match cli.command {
        Commands::Chat { session } => commands::chat::run(&cli.config, &session).await?,
        Commands::Ask { message, session } => {
            commands::ask::run(&cli.config, &message, &session).await?
        }
        Commands::Serve { port } => commands::serve::run(&cli.config, port).await?,
        Commands::Version => commands::version::run(),
    }

    Ok(())
}
