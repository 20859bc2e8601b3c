//! Rate limiting, backoff and cooldown for LLM model quotas.
//!
//! This crate gates outgoing generation requests against three simultaneous
//! per-model quotas:
//! - **RPM**: requests per minute
//! - **TPM**: estimated tokens per minute (word count × 1.33)
//! - **RPD**: requests per day
//!
//! Transient RPM/TPM pressure is absorbed by a short jittered backoff inside
//! [`RateLimiter::check_limit`]. A model that stays saturated for three attempts
//! is placed into a timed cooldown during which every check fails fast.
//!
//! Limits are loaded from TOML via [`LimiterConfig::load`]; models without an
//! entry use conservative defaults.

mod config;
mod limiter;
mod tokens;
mod window;

pub use config::{EvictionPolicy, LimiterConfig, ModelLimits, normalize_model_key};
pub use limiter::{MAX_ATTEMPTS, RateLimitResult, RateLimiter};
pub use tokens::{TOKENS_PER_WORD, estimate_tokens};
pub use window::{DAY_WINDOW, MINUTE_WINDOW, UsageSnapshot, UsageWindow};
