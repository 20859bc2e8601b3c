//! Errors raised while loading or validating limiter configuration.

/// A rejected or unreadable limiter configuration.
///
/// Raised by `LimiterConfig::load`, `from_file` and `validate` when a TOML
/// source cannot be read or parsed, or when a quota or policy value is
/// unusable (a zero limit, an empty default model).
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Invalid limiter configuration: {} ({}:{})", message, file, line)]
pub struct ConfigError {
    /// What was wrong with the configuration
    pub message: String,
    /// Line of the check that rejected it
    pub line: u32,
    /// Source file of the check that rejected it
    pub file: &'static str,
}

impl ConfigError {
    /// Reject a configuration, recording the caller's location.
    ///
    /// ```
    /// use cadence_error::ConfigError;
    ///
    /// let err = ConfigError::new("cooldown_minutes must be positive");
    /// assert!(err.to_string().starts_with("Invalid limiter configuration: cooldown_minutes"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let caller = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: caller.line(),
            file: caller.file(),
        }
    }
}
