//! horoshop - command-line access to a Horoshop store.
//!
//! Reads the store URL and login from `~/.config/horoshop/config.json` or the
//! `HOROSHOP_URL` / `HOROSHOP_LOGIN` environment variables, the password from
//! `HOROSHOP_PASSWORD` (prompted when unset), and prints results as JSON.

mod commands;

use std::io;

use anyhow::{Context, Result};
use horoshop_core::config::ENV_PASSWORD;
use horoshop_core::{ApiClient, Config};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;

/// Directory for a daily rolling log file, in addition to stderr
const ENV_LOG_DIR: &str = "HOROSHOP_LOG_DIR";

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "horoshop.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn read_password() -> Result<String> {
    match std::env::var(ENV_PASSWORD) {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => rpassword::prompt_password("Horoshop API password: ")
            .context("Failed to read password"),
    }
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
    if command == Command::Help {
        println!("{}", commands::USAGE);
        return Ok(());
    }

    let _guard = init_tracing();

    let config = Config::load()?.with_env();
    let password = read_password()?;
    let credentials = config.credentials(&password)?;
    let store = config.token_store()?;

    info!(store = ?config.token_store, "Connecting to Horoshop API");
    let client = ApiClient::connect(credentials, store).await?;

    let output = command.run(&client).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
