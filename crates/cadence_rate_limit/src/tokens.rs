//! Word-count token estimate used for TPM accounting.

/// Tokens assumed per whitespace-separated word.
pub const TOKENS_PER_WORD: f64 = 1.33;

/// Estimate the tokens in a prompt as `word_count * 1.33`.
///
/// This is a heuristic for quota accounting, not a tokenizer; it is not
/// billing-accurate.
///
/// ```
/// use cadence_rate_limit::estimate_tokens;
///
/// assert!((estimate_tokens("a b c d") - 5.32).abs() < 1e-9);
/// assert_eq!(estimate_tokens(""), 0.0);
/// ```
pub fn estimate_tokens(text: &str) -> f64 {
    text.split_whitespace().count() as f64 * TOKENS_PER_WORD
}
