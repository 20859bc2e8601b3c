//! Top-level error wrapper types.

use crate::{ConfigError, GenerateError, ProviderError, RateLimitError};

/// Union of every error the Cadence crates produce.
///
/// # Examples
///
/// ```
/// use cadence_error::{CadenceError, ConfigError};
///
/// let err: CadenceError = ConfigError::new("missing default_model").into();
/// assert!(err.to_string().contains("Invalid limiter configuration"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum CadenceErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Rate limiter refusal
    #[from(RateLimitError)]
    RateLimit(RateLimitError),
    /// Provider failure
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Generation cascade exhausted
    #[from(GenerateError)]
    Generate(GenerateError),
}

/// Cadence error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Cadence Error: {}", _0)]
pub struct CadenceError(Box<CadenceErrorKind>);

impl CadenceError {
    /// Create a new error from a kind.
    pub fn new(kind: CadenceErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &CadenceErrorKind {
        &self.0
    }
}

impl<T> From<T> for CadenceError
where
    T: Into<CadenceErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Cadence operations.
pub type CadenceResult<T> = std::result::Result<T, CadenceError>;
