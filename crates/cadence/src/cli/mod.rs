//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the cadence binary.

mod check;
mod commands;
mod limits;

pub use check::run_checks;
pub use commands::{Cli, Commands, OutputFormat};
pub use limits::show_limits;
