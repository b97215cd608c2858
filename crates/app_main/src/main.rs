//! logview - browse, tail and search log files and log archives
//!
//! Main entry point. Each subcommand is one request against the façade;
//! content goes to stdout, diagnostics to stderr and the log file.

mod cli;

use anyhow::Result;
use app_core::{AppConfig, LogView};
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Initialize logging and panic hook first
    let _log_guard = app_log::init()?;

    // Clean up old logs (7 days)
    if let Err(e) = app_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(dir) = &cli.log_dir {
        config.logview.path = Some(dir.clone());
        config.logging = Default::default();
    }

    let view = LogView::new(&config)?;

    if let Err(e) = cli::run(&view, cli.command) {
        match e.downcast_ref::<app_core::AppError>() {
            Some(app_err) if app_err.is_client_error() => {
                tracing::warn!(error = %e, "Request rejected");
                anyhow::bail!(app_err.user_message())
            }
            Some(app_err) => {
                tracing::error!(error = %e, "Request failed");
                anyhow::bail!(app_err.user_message())
            }
            None => {
                tracing::error!(error = %e, "Request failed");
                return Err(e);
            }
        }
    }

    Ok(())
}
