//! Errors raised by the rate limiter when a request cannot be admitted.

use std::time::{Duration, Instant};

/// Reasons the rate limiter refused a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// The model is cooling down after repeated failures.
    #[display("Model '{}' is in cooldown for another {:?}", model, remaining)]
    ModelInCooldown {
        /// Normalized model key
        model: String,
        /// Instant at which the cooldown ends
        expires_at: Instant,
        /// Time left when the check was refused
        remaining: Duration,
    },
    /// The model's requests-per-day quota is spent.
    #[display("Daily request limit of {} reached for model '{}'", limit, model)]
    DailyLimitExceeded {
        /// Normalized model key
        model: String,
        /// Configured requests per day
        limit: u32,
    },
    /// Every backoff attempt hit RPM or TPM pressure; the model now cools down.
    #[display(
        "Model '{}' still rate limited after {} attempts; cooling down for {:?}",
        model,
        attempts,
        cooldown
    )]
    RateLimited {
        /// Normalized model key
        model: String,
        /// Number of admission attempts made
        attempts: u32,
        /// Instant at which the cooldown ends
        cooldown_until: Instant,
        /// Length of the cooldown that was applied
        cooldown: Duration,
    },
    /// The caller cancelled while the limiter was waiting.
    #[display("Rate limit wait for model '{}' was cancelled", _0)]
    Cancelled(String),
    /// The model identifier was empty or unusable.
    #[display("Invalid model identifier: '{}'", _0)]
    InvalidModel(String),
}

impl RateLimitErrorKind {
    /// The normalized model key this error refers to.
    pub fn model(&self) -> &str {
        match self {
            RateLimitErrorKind::ModelInCooldown { model, .. }
            | RateLimitErrorKind::DailyLimitExceeded { model, .. }
            | RateLimitErrorKind::RateLimited { model, .. } => model,
            RateLimitErrorKind::Cancelled(model) | RateLimitErrorKind::InvalidModel(model) => model,
        }
    }
}

/// Rate limiting error with location tracking.
///
/// # Examples
///
/// ```
/// use cadence_error::{RateLimitError, RateLimitErrorKind};
///
/// let err = RateLimitError::new(RateLimitErrorKind::DailyLimitExceeded {
///     model: "gemini-2.5-pro".to_string(),
///     limit: 50,
/// });
/// assert!(format!("{}", err).contains("Daily request limit of 50"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    /// The kind of error that occurred
    pub kind: RateLimitErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }
}

impl From<RateLimitErrorKind> for RateLimitError {
    #[track_caller]
    fn from(kind: RateLimitErrorKind) -> Self {
        Self::new(kind)
    }
}
