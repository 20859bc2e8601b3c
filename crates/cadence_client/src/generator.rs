//! The text-generation provider boundary.

use async_trait::async_trait;
use cadence_error::ProviderError;
use serde::{Deserialize, Serialize};

/// Per-call generation options passed through to the provider.
///
/// # Examples
///
/// ```
/// use cadence_client::GenerateOptions;
///
/// let options = GenerateOptions::builder()
///     .temperature(Some(0.2))
///     .max_tokens(Some(256))
///     .build()
///     .unwrap();
///
/// assert_eq!(*options.max_tokens(), Some(256));
/// assert_eq!(*options.system_instruction(), None);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(default, setter(into))]
pub struct GenerateOptions {
    /// Sampling temperature
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    max_tokens: Option<u32>,
    /// System instruction prepended by the provider
    system_instruction: Option<String>,
}

impl GenerateOptions {
    /// Creates a new options builder.
    pub fn builder() -> GenerateOptionsBuilder {
        GenerateOptionsBuilder::default()
    }
}

/// A text-generation provider.
///
/// Implementations translate their raw failures into [`ProviderError`] once,
/// typically with [`ProviderError::from_raw`], so the client never inspects
/// provider messages itself.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for `prompt` with the named model.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ProviderError>;

    /// Provider name (e.g., "gemini") used in logs and metrics.
    fn provider_name(&self) -> &'static str;
}
