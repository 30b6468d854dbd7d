//! `initdb` - provision and seed a fresh `MongoDB` database.
//!
//! # Usage
//!
//! ```bash
//! # Create the database owner, the users collection and the seed users
//! initdb bootstrap
//!
//! # Same thing; bootstrap is the default command
//! initdb
//!
//! # Check that the configured server is reachable
//! initdb ping
//!
//! # Show the resolved configuration (secrets redacted)
//! initdb config
//! ```
//!
//! # Commands
//!
//! - `bootstrap` - Provision and seed the database (run once per container)
//! - `ping` - Connection check
//! - `config` - Print the resolved configuration
//!
//! # Logging
//!
//! Logs go to stderr so stdout carries only the progress banners.
//! `RUST_LOG` overrides the filter; `LOG_FORMAT=json` emits JSON lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mongo_initdb_cli::BootstrapError;
use mongo_initdb_cli::config::DEFAULT_ENV_FILE;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "initdb")]
#[command(author, version, about = "Provision and seed a fresh MongoDB database")]
struct Cli {
    /// Dotenv file read when the process environment is incomplete
    #[arg(long, global = true, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database owner, the users collection and the seed users
    Bootstrap,
    /// Check that the configured server answers
    Ping,
    /// Print the resolved configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), BootstrapError> {
    match cli.command.unwrap_or(Commands::Bootstrap) {
        Commands::Bootstrap => commands::bootstrap::run(&cli.env_file).await?,
        Commands::Ping => commands::ping::run(&cli.env_file).await?,
        Commands::Config => commands::show_config::run(&cli.env_file)?,
    }
    Ok(())
}

/// Initialize tracing with `EnvFilter`, writing to stderr.
///
/// Defaults to info level for our crates if `RUST_LOG` is not set.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mongo_initdb_cli=info,initdb=info,mongo_initdb_core=info".into());

    let is_json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
