//! Error types for the Cadence library.
//!
//! This crate provides the foundation error types used throughout the Cadence workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! [`GenerateError`] is the exception: it carries the ordered list of models a
//! generation attempted, so callers can see every failure in a fallback cascade.
//!
//! # Examples
//!
//! ```
//! use cadence_error::{CadenceResult, ConfigError};
//!
//! fn load() -> CadenceResult<String> {
//!     Err(ConfigError::new("max_entries must be positive"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod generate;
mod provider;
mod rate_limit;

pub use config::ConfigError;
pub use error::{CadenceError, CadenceErrorKind, CadenceResult};
pub use generate::{AttemptError, GenerateError, ModelAttempt};
pub use provider::{ProviderError, ProviderErrorKind};
pub use rate_limit::{RateLimitError, RateLimitErrorKind};
