//! Rate-limited LLM generation for Cadence.
//!
//! This crate wraps a provider implementing [`Generator`] with:
//! - Rate limit clearance from a shared [`cadence_rate_limit::RateLimiter`]
//! - One immediate same-model retry on transient provider failures
//! - An ordered model-fallback cascade
//! - Jittered outer retries for HTTP 429
//! - Cooldown on provider quota exhaustion
//! - Cancellation of limiter waits and in-flight calls
//!
//! # Example
//!
//! ```no_run
//! use cadence_client::{Client, GenerateOptions, Generator};
//! use cadence_error::ProviderError;
//! use cadence_rate_limit::{LimiterConfig, RateLimiter};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo(provider: Arc<dyn Generator>) -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = Arc::new(RateLimiter::new(LimiterConfig::load()?));
//! let client = Client::new(Arc::clone(&limiter), provider);
//!
//! let options = GenerateOptions::builder().max_tokens(Some(200)).build()?;
//! let text = client
//!     .generate("Categorize this receipt", Some("gemini-2.5-pro"), 3, &options, &CancellationToken::new())
//!     .await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod generator;
mod metrics;

pub use client::{CascadeStep, Client, StepRole, cascade_plan};
pub use generator::{GenerateOptions, GenerateOptionsBuilder, Generator};
pub use metrics::ClientMetrics;
