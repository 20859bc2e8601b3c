//! Typed errors returned across the text-generation provider boundary.
//!
//! Providers surface failures as free-form messages. [`ProviderErrorKind::classify`]
//! is the single place those messages are inspected; everything downstream matches
//! on the resulting kind.

/// Failure classes reported by a text-generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Provider-side rate limiting (RPM or "rate limit" messages)
    #[display("Provider rate limit: {}", _0)]
    RateLimit(String),
    /// Provider quota exhausted; retrying will not help
    #[display("Provider quota exhausted: {}", _0)]
    QuotaExhausted(String),
    /// HTTP 429 Too Many Requests without a more specific cause
    #[display("HTTP 429 Too Many Requests: {}", _0)]
    TooManyRequests(String),
    /// The call succeeded but returned no text
    #[display("Provider returned an empty response")]
    EmptyResponse,
    /// The caller cancelled the in-flight call
    #[display("Provider call was cancelled")]
    Cancelled,
    /// Any other provider failure
    #[display("Provider API error: {}", _0)]
    Api(String),
}

impl ProviderErrorKind {
    /// Translate a raw provider message into a failure class.
    ///
    /// Matching is case-insensitive and checked in priority order: rate limit
    /// (`"rpm"`, `"rate limit"`), then quota (`"quota"`), then HTTP 429 (`"429"`).
    ///
    /// # Examples
    ///
    /// ```
    /// use cadence_error::ProviderErrorKind;
    ///
    /// assert!(matches!(
    ///     ProviderErrorKind::classify("Resource has been exhausted (check quota)"),
    ///     ProviderErrorKind::QuotaExhausted(_)
    /// ));
    /// assert!(matches!(
    ///     ProviderErrorKind::classify("status 429"),
    ///     ProviderErrorKind::TooManyRequests(_)
    /// ));
    /// ```
    pub fn classify(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        let message = raw.to_string();

        if lowered.contains("rpm") || lowered.contains("rate limit") {
            ProviderErrorKind::RateLimit(message)
        } else if lowered.contains("quota") {
            ProviderErrorKind::QuotaExhausted(message)
        } else if lowered.contains("429") {
            ProviderErrorKind::TooManyRequests(message)
        } else {
            ProviderErrorKind::Api(message)
        }
    }

    /// Whether the cascade treats this failure as transient (same-model retry, then fallbacks).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimit(_) | ProviderErrorKind::EmptyResponse
        )
    }

    /// Short label used for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderErrorKind::RateLimit(_) => "rate_limit",
            ProviderErrorKind::QuotaExhausted(_) => "quota",
            ProviderErrorKind::TooManyRequests(_) => "too_many_requests",
            ProviderErrorKind::EmptyResponse => "empty_response",
            ProviderErrorKind::Cancelled => "cancelled",
            ProviderErrorKind::Api(_) => "api",
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use cadence_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::from_raw("429 Too Many Requests");
/// assert!(matches!(err.kind, ProviderErrorKind::TooManyRequests(_)));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Classify a raw provider message and wrap it.
    #[track_caller]
    pub fn from_raw(raw: impl AsRef<str>) -> Self {
        Self::new(ProviderErrorKind::classify(raw.as_ref()))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ProviderErrorKind {
        &self.kind
    }
}

impl From<ProviderErrorKind> for ProviderError {
    #[track_caller]
    fn from(kind: ProviderErrorKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_rate_limit_is_case_insensitive() {
        assert!(matches!(
            ProviderErrorKind::classify("Exceeded RPM for model"),
            ProviderErrorKind::RateLimit(_)
        ));
        assert!(matches!(
            ProviderErrorKind::classify("RATE LIMIT reached"),
            ProviderErrorKind::RateLimit(_)
        ));
    }

    #[test]
    fn classify_prefers_rate_limit_over_quota_and_429() {
        assert!(matches!(
            ProviderErrorKind::classify("429: rate limit exceeded, quota resets soon"),
            ProviderErrorKind::RateLimit(_)
        ));
    }

    #[test]
    fn classify_prefers_quota_over_429() {
        assert!(matches!(
            ProviderErrorKind::classify("429 RESOURCE_EXHAUSTED: Quota exceeded"),
            ProviderErrorKind::QuotaExhausted(_)
        ));
    }

    #[test]
    fn classify_falls_back_to_api() {
        let kind = ProviderErrorKind::classify("400 invalid argument");
        assert_eq!(kind, ProviderErrorKind::Api("400 invalid argument".to_string()));
        assert!(!kind.is_transient());
    }

    #[test]
    fn transient_kinds() {
        assert!(ProviderErrorKind::EmptyResponse.is_transient());
        assert!(ProviderErrorKind::RateLimit(String::new()).is_transient());
        assert!(!ProviderErrorKind::TooManyRequests(String::new()).is_transient());
        assert!(!ProviderErrorKind::QuotaExhausted(String::new()).is_transient());
    }
}
