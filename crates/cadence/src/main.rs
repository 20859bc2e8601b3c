//! Cadence CLI binary.
//!
//! This binary provides command-line access to Cadence's rate limiter:
//! - Show the resolved per-model limits
//! - Exercise the limiter against a model and watch backoff and cooldown

use cadence::LimiterConfig;
use clap::Parser;
use tokio_util::sync::CancellationToken;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use cli::{Cli, Commands, run_checks, show_limits};

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let directives = if cli.verbose {
        "debug"
    } else {
        cadence::DEFAULT_DIRECTIVES
    };
    cadence::init_telemetry_with(directives, cli.json)?;

    let config = match &cli.config {
        Some(path) => LimiterConfig::from_file(path)?,
        None => LimiterConfig::load()?,
    };

    // Execute the requested command
    match cli.command {
        Commands::Limits { model, format } => {
            show_limits(&config, model.as_deref(), format)?;
        }

        Commands::Check {
            model,
            prompt,
            count,
        } => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });
            let summary = run_checks(config, &model, &prompt, count, &cancel).await;
            tracing::info!(
                granted = summary.granted,
                refused = summary.refused.is_some(),
                "Limit checks complete"
            );
        }
    }

    Ok(())
}
