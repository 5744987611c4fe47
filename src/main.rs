//! patternsense - interaction pattern detection for document trees
//!
//! Main entry point for the patternsense CLI.

mod cli;
mod cmd_config;
mod cmd_scan;

use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use patternsense_config::{Config, ConfigLoader, LoggingConfig};

use cli::{Cli, Commands};

/// Initialize tracing with console and optional file output.
///
/// `RUST_LOG` wins over `level`. Console output goes to stderr so that
/// `--json` output on stdout stays machine readable.
fn init_tracing(logging: &LoggingConfig, level: Option<&str>, log_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level.unwrap_or(&logging.level))
            .with_context(|| format!("invalid log level: {}", level.unwrap_or(&logging.level)))?,
    };

    let console = if logging.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let log_dir = log_dir.or_else(|| {
        logging
            .file_dir
            .as_deref()
            .map(|dir| PathBuf::from(ConfigLoader::expand_path(dir)))
    });
    let file = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("patternsense")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&dir)
                .context("failed to create log file appender")?;

            // The worker flushes on drop, so the guard lives for the whole process.
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            static GUARD: OnceLock<WorkerGuard> = OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    ConfigLoader::load_or_default(path).with_context(|| match path {
        Some(p) => format!("failed to load config {}", p.display()),
        None => "failed to load default config".to_string(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging, cli.log_level.as_deref(), cli.log_file.clone())?;
    debug!(version = env!("CARGO_PKG_VERSION"), "patternsense starting");

    match cli.command {
        Commands::Detect {
            document,
            pattern,
            guarantee,
            json,
        } => cmd_scan::detect(&config, &document, pattern.as_deref(), &guarantee, json),
        Commands::Diff { before, after, json } => cmd_scan::diff(&config, &before, &after, json),
        Commands::Similar {
            query,
            candidates,
            min,
            limit,
            json,
        } => cmd_scan::similar(&config, &query, &candidates, min, limit, json),
        Commands::Patterns { json } => cmd_config::patterns(&config, json),
        Commands::Validate => cmd_config::validate(&config, cli.config.as_deref()),
    }
}
