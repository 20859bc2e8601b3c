//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Cadence - adaptive rate limiting for LLM generation
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(about = "Inspect and exercise per-model LLM rate limits", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Load limits from this file instead of the layered defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the resolved configuration, or the limits of one model
    Limits {
        /// Model to resolve (all configured models when omitted)
        model: Option<String>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Run repeated limit checks for a model against a fresh limiter
    Check {
        /// Model to check
        model: String,

        /// Prompt whose token estimate is charged per request
        prompt: String,

        /// Number of checks to run
        #[arg(long, default_value = "1")]
        count: u32,
    },
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
