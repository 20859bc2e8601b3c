//! Terminal error for a generation that exhausted its retry and fallback cascade.

use crate::{ProviderError, RateLimitError};
use std::fmt;

/// Why a single model attempt failed.
#[derive(Debug, Clone, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum AttemptError {
    /// The rate limiter refused the request
    #[from(RateLimitError)]
    Limiter(RateLimitError),
    /// The provider call failed
    #[from(ProviderError)]
    Provider(ProviderError),
}

/// One model tried during a generation, and how it failed.
#[derive(Debug, Clone)]
pub struct ModelAttempt {
    /// Model identifier as requested
    pub model: String,
    /// The failure observed for this attempt
    pub error: AttemptError,
}

/// Generation failure carrying every attempted model in cascade order.
///
/// The most recent failure is exposed through [`std::error::Error::source`].
///
/// # Examples
///
/// ```
/// use cadence_error::{GenerateError, ModelAttempt, ProviderError, ProviderErrorKind};
///
/// let err = GenerateError::new(vec![ModelAttempt {
///     model: "gemini-2.5-pro".to_string(),
///     error: ProviderError::new(ProviderErrorKind::EmptyResponse).into(),
/// }]);
/// assert_eq!(err.models(), vec!["gemini-2.5-pro"]);
/// assert!(std::error::Error::source(&err).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct GenerateError {
    attempts: Vec<ModelAttempt>,
    line: u32,
    file: &'static str,
}

impl GenerateError {
    /// Create a new GenerateError from the attempts made, with location tracking.
    #[track_caller]
    pub fn new(attempts: Vec<ModelAttempt>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            attempts,
            line: location.line(),
            file: location.file(),
        }
    }

    /// All attempts in the order they were made.
    pub fn attempts(&self) -> &[ModelAttempt] {
        &self.attempts
    }

    /// Model identifiers in attempt order (repeats included).
    pub fn models(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.model.as_str()).collect()
    }

    /// The failure that ended the cascade.
    pub fn last(&self) -> Option<&ModelAttempt> {
        self.attempts.last()
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Generate Error: {} attempt(s) failed at line {} in {}",
            self.attempts.len(),
            self.line,
            self.file
        )?;
        for attempt in &self.attempts {
            write!(f, "; {}: {}", attempt.model, attempt.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.attempts
            .last()
            .map(|attempt| &attempt.error as &(dyn std::error::Error + 'static))
    }
}
