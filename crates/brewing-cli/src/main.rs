//! Brewing - terminal front-end for the brewing companion account screens.
//!
//! Restores the saved session at start-up, then runs one account command
//! (status, login, signup, guest, logout, rename, avatar).

mod commands;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use brewing_core::Config;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;

/// Log file name in the data directory
const LOG_FILE: &str = "brewing.log";

/// Open the log file in `dir`, creating the directory if needed.
fn open_log_file(dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir).context("Failed to create log directory")?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(dir)
        .context("Failed to open log file")
}

/// Initialize the tracing subscriber for logging.
/// Falls back to stderr only when the log file cannot be opened.
/// The returned guard must stay alive for file logs to be flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = log_dir.map(open_log_file).transpose();
    let (file_layer, guard, file_error) = match appender {
        Ok(Some(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard), None)
        }
        Ok(None) => (None, None, None),
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    if let Some(e) = file_error {
        warn!(error = %format!("{:#}", e), "File logging disabled");
    }

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, commands::USAGE);
            std::process::exit(2);
        }
    };

    let data_dir = Config::data_dir().ok();
    let _log_guard = init_tracing(data_dir.as_deref());

    let config = Config::load()?;
    info!(api_url = config.api_url(), storage = %config.storage, "Brewing starting");

    let manager = config.session_manager()?;
    manager.restore().await;

    commands::run(&manager, command).await
}
