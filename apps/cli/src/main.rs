//! # Storefront Command Line Entry Point
//!
//! ```text
//! main.rs ────► builds the runtime, hands over to storefront_cli::run
//! lib.rs ─────► tracing, config, database, dispatch
//! commands/ ──► sale, purchase, reports
//! ```

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    storefront_cli::run().await
}
