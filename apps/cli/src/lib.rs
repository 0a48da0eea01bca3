//! # Storefront CLI
//!
//! One invocation, one operation:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Invocation                                      │
//! │                                                                         │
//! │  1. Parse arguments (clap)                                             │
//! │  2. Initialize logging (stderr, RUST_LOG)                              │
//! │  3. Load config: defaults → storefront.toml → STOREFRONT_* → --db     │
//! │  4. Open the database (WAL, migrations)                                │
//! │  5. Build coordinator + reader, check the configured location          │
//! │  6. Dispatch the subcommand                                            │
//! │  7. stdout: JSON result, exit 0                                        │
//! │     stderr: {"code", "message"}, exit 1                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storefront_db::Database;

pub mod commands;
pub mod config;
pub mod error;

use commands::{AppContext, Command};
use config::AppConfig;
use error::ApiError;

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Record sales and purchases against a local SQLite store", version)]
pub struct Cli {
    /// Config file (default: storefront.toml in the platform config dir)
    #[arg(long, global = true, env = "STOREFRONT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overrides the configured path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Runs the CLI and maps the outcome to an exit code.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match execute(cli).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(out) => {
                println!("{}", out);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", ApiError::from(e).to_json());
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("{}", err.to_json());
            ExitCode::FAILURE
        }
    }
}

pub async fn execute(cli: Cli) -> Result<Value, ApiError> {
    let mut config = AppConfig::load(cli.config)?;
    if let Some(path) = cli.db {
        config.database.path = path;
    }

    info!(path = ?config.database.path, "Opening database");
    let db = Database::new(config.to_db_config()).await?;

    let result = match AppContext::new(db.clone(), &config).await {
        Ok(ctx) => commands::dispatch(&ctx, cli.command).await,
        Err(e) => Err(e),
    };

    db.close().await;
    result
}

/// Initializes the tracing subscriber on stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=storefront=trace` - Show trace for storefront crates only
/// - Default: `info,storefront=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storefront=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
