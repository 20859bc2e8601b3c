//! Tracing subscriber setup for the cadence binary and embedding applications.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Directives used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVES: &str = "info,cadence=debug";

/// Initialize console logging with the default directives.
///
/// `RUST_LOG` overrides the filter when set. With `json`, events are written as
/// newline-delimited JSON instead of human-readable lines.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_telemetry(json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_telemetry_with(DEFAULT_DIRECTIVES, json)
}

/// Initialize console logging, falling back to `directives` when `RUST_LOG` is unset.
///
/// # Errors
///
/// Fails if `directives` cannot be parsed or a global subscriber is already installed.
pub fn init_telemetry_with(
    directives: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directives)?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()?;
    }

    Ok(())
}
