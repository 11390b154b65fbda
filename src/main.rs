//! choque - keep servers alive by pinging URLs on a schedule.

mod commands;
mod config;
mod error;
mod probe;
mod record;
mod report;
mod scheduler;

use clap::{Parser, Subcommand};
use record::LogSink;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Diagnostic filter used when `RUST_LOG` is unset.
const LOG_FILTER: &str = "choque=info";

#[derive(Parser)]
#[command(name = "choque")]
#[command(about = "CLI tool to keep servers alive by pinging URLs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the JSON config file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Path to the append-only log file
    #[arg(long, global = true, default_value = config::DEFAULT_LOG_PATH)]
    log_file: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start pinging configured URLs
    Start,
    /// Add a URL to ping
    Add {
        /// URL to ping
        #[arg(long)]
        url: Option<String>,
        /// Ping interval in seconds
        #[arg(long, allow_negative_numbers = true)]
        interval: Option<String>,
    },
    /// Generate a summary report
    Report,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(LOG_FILTER)))
        .init();

    let cli = Cli::parse();

    let (sink, guard) = match LogSink::open(&cli.log_file) {
        Ok(opened) => opened,
        Err(e) => {
            tracing::error!("Failed to open log {}: {}", cli.log_file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Start => {
            tokio::select! {
                result = commands::start(&cli.config, &sink) => result,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, shutting down");
                    Ok(())
                }
            }
        }
        Commands::Add { url, interval } => commands::add(&cli.config, url.as_deref(), interval.as_deref(), &sink)
            .await
            .map(|_| ()),
        Commands::Report => commands::report(&cli.log_file, &sink).await.map(|_| ()),
    };

    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Err(log_err) = sink.error(&e.to_string()) {
                tracing::error!("Failed to log error: {}", log_err);
            }
            ExitCode::FAILURE
        }
    };

    // Flush pending lines before exit.
    drop(sink);
    drop(guard);

    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_args(interval: &str) -> Option<(Option<String>, Option<String>)> {
        let cli = Cli::try_parse_from(["choque", "add", "--url", "http://x", "--interval", interval]).ok()?;
        match cli.command {
            Commands::Add { url, interval } => Some((url, interval)),
            _ => None,
        }
    }

    #[test]
    fn test_add_accepts_negative_interval() {
        let (url, interval) = add_args("-5").unwrap();
        assert_eq!(url.as_deref(), Some("http://x"));
        assert_eq!(interval.as_deref(), Some("-5"));
    }

    #[test]
    fn test_add_passes_non_numeric_interval_through() {
        let (_, interval) = add_args("abc").unwrap();
        assert_eq!(interval.as_deref(), Some("abc"));
    }

    #[test]
    fn test_add_flags_are_optional() {
        let cli = Cli::try_parse_from(["choque", "add", "--url", "http://x"]).unwrap();
        assert!(matches!(cli.command, Commands::Add { interval: None, .. }));
    }

    #[test]
    fn test_log_filter_is_crate_scoped() {
        let filter = EnvFilter::new(LOG_FILTER);
        assert_eq!(filter.to_string(), "choque=info");
    }
}
