//! Generation orchestration: rate limit clearance, same-model retry and
//! model fallback.
//!
//! # Cascade
//!
//! A generation walks an explicit plan of steps:
//!
//! ```text
//! [requested model, requested model (retry), fallback 1, fallback 2, ...]
//! ```
//!
//! The retry step is only reached after a transient failure (provider rate
//! limit or empty response) of the first call. Once there, any failure short
//! of cancellation moves on to the next fallback. Quota exhaustion sends the model
//! into cooldown. HTTP 429 is retried on the same step with a long jittered
//! backoff while the outer retry budget lasts.

use crate::{ClientMetrics, GenerateOptions, Generator};
use cadence_error::{
    AttemptError, GenerateError, ModelAttempt, ProviderError, ProviderErrorKind,
    RateLimitErrorKind,
};
use cadence_rate_limit::{RateLimiter, normalize_model_key};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Where a step sits in the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepRole {
    /// First call to the requested model
    Primary,
    /// Single immediate retry of the requested model
    Retry,
    /// A configured fallback model
    Fallback,
}

/// One model call in a generation cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeStep {
    /// Model to call
    pub model: String,
    /// Role of the step
    pub role: StepRole,
}

/// Build the cascade for `model` with the given fallbacks.
///
/// Fallbacks that normalize to the requested model are skipped.
///
/// ```
/// use cadence_client::{StepRole, cascade_plan};
///
/// let plan = cascade_plan("pro", &["flash".to_string(), "models/PRO".to_string()]);
/// let models: Vec<_> = plan.iter().map(|s| s.model.as_str()).collect();
/// assert_eq!(models, ["pro", "pro", "flash"]);
/// assert_eq!(plan[1].role, StepRole::Retry);
/// ```
pub fn cascade_plan(model: &str, fallbacks: &[String]) -> Vec<CascadeStep> {
    let key = normalize_model_key(model);
    let mut plan = vec![
        CascadeStep {
            model: model.to_string(),
            role: StepRole::Primary,
        },
        CascadeStep {
            model: model.to_string(),
            role: StepRole::Retry,
        },
    ];
    plan.extend(
        fallbacks
            .iter()
            .filter(|fallback| normalize_model_key(fallback) != key)
            .map(|fallback| CascadeStep {
                model: fallback.clone(),
                role: StepRole::Fallback,
            }),
    );
    plan
}

/// What the cascade does after a failed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextMove {
    Advance,
    Stop,
}

fn next_move(role: StepRole, error: &AttemptError) -> NextMove {
    match error {
        AttemptError::Limiter(e) if matches!(e.kind, RateLimitErrorKind::Cancelled(_)) => {
            NextMove::Stop
        }
        AttemptError::Provider(e) if e.kind == ProviderErrorKind::Cancelled => NextMove::Stop,
        AttemptError::Provider(e) if e.kind.is_transient() => NextMove::Advance,
        _ => match role {
            StepRole::Primary => NextMove::Stop,
            StepRole::Retry | StepRole::Fallback => NextMove::Advance,
        },
    }
}

/// Outer backoff for HTTP 429: `2^(3 - retries_left) + U(0.1, 55)` seconds.
fn too_many_requests_backoff(retries_left: u32) -> Duration {
    let exponent = 3 - retries_left.min(i32::MAX as u32) as i32;
    let jitter = rand::thread_rng().gen_range(0.1..55.0);
    Duration::from_secs_f64(2f64.powi(exponent) + jitter)
}

/// Rate-limited generation client.
///
/// Shares one [`RateLimiter`] with every other client in the process; default
/// and fallback models come from the limiter's configuration.
///
/// # Example
///
/// ```no_run
/// use cadence_client::{Client, GenerateOptions, Generator};
/// use cadence_error::ProviderError;
/// use cadence_rate_limit::{LimiterConfig, RateLimiter};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// struct Echo;
///
/// #[async_trait::async_trait]
/// impl Generator for Echo {
///     async fn generate(&self, _: &str, prompt: &str, _: &GenerateOptions) -> Result<String, ProviderError> {
///         Ok(prompt.to_string())
///     }
///     fn provider_name(&self) -> &'static str { "echo" }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = Arc::new(RateLimiter::new(LimiterConfig::load()?));
/// let client = Client::new(limiter, Arc::new(Echo));
/// let text = client
///     .generate("Hello", None, 3, &GenerateOptions::default(), &CancellationToken::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    limiter: Arc<RateLimiter>,
    generator: Arc<dyn Generator>,
    metrics: ClientMetrics,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("provider", &self.generator.provider_name())
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client over a shared limiter and a provider.
    pub fn new(limiter: Arc<RateLimiter>, generator: Arc<dyn Generator>) -> Self {
        Self {
            limiter,
            generator,
            metrics: ClientMetrics::default(),
        }
    }

    /// The shared rate limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Generate text, walking the retry and fallback cascade on failure.
    ///
    /// `model` defaults to the configured default model. `max_outer_retries`
    /// bounds HTTP 429 retries on each step.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerateError`] listing every model attempted and why it
    /// failed, once the cascade stops or is exhausted.
    #[instrument(
        skip(self, prompt, model, options, cancel),
        fields(provider = self.generator.provider_name(), model = tracing::field::Empty)
    )]
    pub async fn generate(
        &self,
        prompt: &str,
        model: Option<&str>,
        max_outer_retries: u32,
        options: &GenerateOptions,
        cancel: &CancellationToken,
    ) -> Result<String, GenerateError> {
        let config = self.limiter.config();
        let model = model.unwrap_or(&config.default_model);
        tracing::Span::current().record("model", model);

        let plan = cascade_plan(model, &config.fallback_models);
        let mut attempts = Vec::new();

        for step in plan {
            if step.role == StepRole::Fallback {
                info!(fallback = %step.model, "Falling back to next model");
                self.metrics.record_fallback(&step.model);
            }

            match self
                .run_step(&step, prompt, max_outer_retries, options, cancel)
                .await
            {
                Ok(text) => {
                    debug!(model = %step.model, role = ?step.role, "Generation succeeded");
                    return Ok(text);
                }
                Err(error) => {
                    let next = next_move(step.role, &error);
                    warn!(
                        model = %step.model,
                        role = ?step.role,
                        error = %error,
                        next = ?next,
                        "Generation step failed"
                    );
                    attempts.push(ModelAttempt {
                        model: step.model,
                        error,
                    });
                    if next == NextMove::Stop {
                        break;
                    }
                }
            }
        }

        Err(GenerateError::new(attempts))
    }

    /// Clear one step through the limiter and call the provider, retrying
    /// HTTP 429 on the same model while the outer budget lasts.
    async fn run_step(
        &self,
        step: &CascadeStep,
        prompt: &str,
        max_outer_retries: u32,
        options: &GenerateOptions,
        cancel: &CancellationToken,
    ) -> Result<String, AttemptError> {
        let provider = self.generator.provider_name();
        let mut retries_left = max_outer_retries;

        loop {
            if let Err(e) = self.limiter.check_limit(&step.model, prompt, cancel).await {
                self.metrics.record_error(provider, &step.model, "rate_limiter");
                return Err(e.into());
            }

            let started = Instant::now();
            let result = tokio::select! {
                result = self.generator.generate(&step.model, prompt, options) => result,
                _ = cancel.cancelled() => Err(ProviderError::new(ProviderErrorKind::Cancelled)),
            };

            let error = match result {
                Ok(text) if !text.trim().is_empty() => {
                    self.metrics.record_request(
                        provider,
                        &step.model,
                        started.elapsed().as_secs_f64(),
                    );
                    return Ok(text);
                }
                Ok(_) => ProviderError::new(ProviderErrorKind::EmptyResponse),
                Err(e) => e,
            };
            self.metrics
                .record_error(provider, &step.model, error.kind.label());

            match &error.kind {
                ProviderErrorKind::QuotaExhausted(_) => {
                    self.limiter.enter_cooldown(&step.model);
                    self.metrics.record_cooldown(&step.model);
                    return Err(error.into());
                }
                ProviderErrorKind::TooManyRequests(_) if retries_left > 0 => {
                    let wait = too_many_requests_backoff(retries_left);
                    warn!(
                        model = %step.model,
                        retries_left,
                        wait_ms = wait.as_millis() as u64,
                        "HTTP 429, retrying same model after backoff"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {}
                        _ = cancel.cancelled() => {
                            return Err(ProviderError::new(ProviderErrorKind::Cancelled).into());
                        }
                    }
                    retries_left -= 1;
                }
                _ => return Err(error.into()),
            }
        }
    }
}
