//! Blueprint Lock
//!
//! Command-line front end for Apstra blueprint mutexes:
//! - lock / unlock: take or release a blueprint lock across invocations
//! - status: show who holds a blueprint lock
//! - run: hold a blueprint lock for the lifetime of a child command

mod cli;
mod commands;
mod config;

use anyhow::{Context, Result};
use cli::Cli;
use config::{Config, ENV_LOG_FILE, Overrides};
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    init_tracing()?;

    let config = Config::from_env(&Overrides::from(&cli.global))?;
    info!("Configuration:");
    info!("  Apstra URL: {}", config.url);
    info!("  Blueprint mutex: {}", if config.mutex_disabled { "disabled" } else { "enabled" });

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    commands::dispatch(cli.command, &config, &cancel).await
}

/// Log to stderr, or append to the file named by `APSTRA_LOG`.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match std::env::var(ENV_LOG_FILE) {
        Ok(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("error opening logfile {}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
