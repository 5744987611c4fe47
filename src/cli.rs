//! CLI definitions for patternsense.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// patternsense CLI.
#[derive(Parser)]
#[command(name = "patternsense")]
#[command(about = "Interaction pattern detection for document trees")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.patternsense/config.toml if present)
    #[arg(short, long, global = true, env = "PATTERNSENSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (overrides logging.level)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory for daily-rolling log files (overrides logging.file_dir)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Scan a JSON document fixture for interaction patterns
    Detect {
        /// Path to the document JSON
        document: PathBuf,

        /// Only look for this pattern (e.g. chat, login, cookie_banner)
        #[arg(short, long)]
        pattern: Option<String>,

        /// Minimum guarantee level (structural, semantic, behavioral, verified)
        #[arg(short, long, default_value = "structural")]
        guarantee: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diff two document fixtures and run the quick pattern rules
    Diff {
        /// Document before the change
        before: PathBuf,

        /// Document after the change
        after: PathBuf,

        /// Print the diff as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank candidate documents by structural similarity to a query
    Similar {
        /// Query document
        query: PathBuf,

        /// Candidate documents to index
        #[arg(required = true)]
        candidates: Vec<PathBuf>,

        /// Minimum similarity in [0, 1]
        #[arg(long, default_value_t = 0.5)]
        min: f64,

        /// Maximum number of results
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the effective pattern specs
    Patterns {
        /// Print specs as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,
}
