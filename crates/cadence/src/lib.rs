//! Cadence - adaptive rate limiting for LLM generation
//!
//! Cadence keeps a process within each model's requests-per-minute,
//! tokens-per-minute and requests-per-day quotas, backs off when a window is
//! saturated, cools models down after repeated pressure, and walks an ordered
//! fallback cascade when a provider call fails.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cadence::{Client, GenerateOptions, LimiterConfig, RateLimiter};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     cadence::init_telemetry(false)?;
//!
//!     let limiter = Arc::new(RateLimiter::new(LimiterConfig::load()?));
//!     let client = Client::new(limiter, Arc::new(MyProvider::new()));
//!
//!     let text = client
//!         .generate("Summarize this", None, 3, &GenerateOptions::default(), &CancellationToken::new())
//!         .await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `cadence_error` - Error types
//! - `cadence_rate_limit` - Usage windows, quotas, backoff and cooldown
//! - `cadence_client` - Provider trait and the retry/fallback cascade
//!
//! This crate (`cadence`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod telemetry;

pub use telemetry::{DEFAULT_DIRECTIVES, init_telemetry, init_telemetry_with};

// Re-export error types
pub use cadence_error::{
    AttemptError, CadenceError, CadenceErrorKind, CadenceResult, ConfigError, GenerateError,
    ModelAttempt, ProviderError, ProviderErrorKind, RateLimitError, RateLimitErrorKind,
};

// Re-export rate limiting
pub use cadence_rate_limit::{
    DAY_WINDOW, EvictionPolicy, LimiterConfig, MAX_ATTEMPTS, MINUTE_WINDOW, ModelLimits,
    RateLimitResult, RateLimiter, TOKENS_PER_WORD, UsageSnapshot, UsageWindow, estimate_tokens,
    normalize_model_key,
};

// Re-export the client
pub use cadence_client::{
    CascadeStep, Client, ClientMetrics, GenerateOptions, GenerateOptionsBuilder, Generator,
    StepRole, cascade_plan,
};
