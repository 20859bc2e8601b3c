//! Rate limiter enforcing per-model RPM, TPM and RPD quotas with cooldowns.
//!
//! A single [`RateLimiter`] is shared (via `Arc`) by every client in a process.
//! One mutex guards all usage windows and the cooldown table. The lock is only
//! held for read-modify-write steps and is always released before a backoff
//! sleep; state is re-validated after reacquiring it.

use crate::{
    LimiterConfig, ModelLimits, UsageSnapshot, UsageWindow, estimate_tokens, normalize_model_key,
};
use cadence_error::{RateLimitError, RateLimitErrorKind};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Admission attempts made before a model is sent into cooldown.
pub const MAX_ATTEMPTS: u32 = 3;

/// Upper bound on a single RPM backoff wait.
const MAX_RPM_WAIT: Duration = Duration::from_secs(60);

/// Slack added past the end of the minute window before re-checking.
const WINDOW_SLACK: Duration = Duration::from_millis(500);

/// Result type for rate limiter operations.
pub type RateLimitResult<T> = Result<T, RateLimitError>;

#[derive(Debug, Default)]
struct LimiterState {
    windows: HashMap<String, UsageWindow>,
    cooldowns: HashMap<String, Instant>,
}

impl LimiterState {
    /// Refuse if `key` is cooling down; forget expired cooldowns.
    fn check_cooldown(&mut self, key: &str, now: Instant) -> RateLimitResult<()> {
        match self.cooldowns.get(key).copied() {
            Some(expiry) if now < expiry => Err(RateLimitError::new(
                RateLimitErrorKind::ModelInCooldown {
                    model: key.to_string(),
                    expires_at: expiry.into_std(),
                    remaining: expiry - now,
                },
            )),
            Some(_) => {
                debug!(model = key, "Cooldown expired");
                self.cooldowns.remove(key);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Outcome of one admission attempt under the lock.
enum Admission {
    Granted { evicted: usize },
    Wait { wait: Duration, reason: &'static str },
    DailyExhausted,
}

/// Shared per-model quota enforcer.
///
/// # Example
///
/// ```no_run
/// use cadence_rate_limit::{LimiterConfig, RateLimiter};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = Arc::new(RateLimiter::new(LimiterConfig::load()?));
/// limiter
///     .check_limit("gemini-2.5-flash", "Summarize this email", &CancellationToken::new())
///     .await?;
/// // ... make the API call ...
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    config: RwLock<Arc<LimiterConfig>>,
    state: Mutex<LimiterState>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(LimiterConfig::default())
    }
}

impl RateLimiter {
    /// Create a limiter with the given configuration.
    #[instrument(skip(config), fields(models = config.models.len()))]
    pub fn new(config: LimiterConfig) -> Self {
        debug!("Creating rate limiter");
        Self {
            config: RwLock::new(Arc::new(config)),
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Replace the limit table and policy values.
    ///
    /// Usage windows and active cooldowns are left untouched, so configuring
    /// twice with the same value behaves exactly like configuring once.
    #[instrument(skip(self, config), fields(models = config.models.len()))]
    pub fn configure(&self, config: LimiterConfig) {
        info!(
            cooldown_minutes = config.cooldown_minutes,
            max_entries = config.max_entries,
            "Rate limiter reconfigured"
        );
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }

    /// Current configuration.
    pub fn config(&self) -> Arc<LimiterConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolved quotas for a model.
    pub fn limits_for(&self, model: &str) -> ModelLimits {
        self.config().limits_for(model)
    }

    fn lock_state(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until `model` may send `prompt`, or fail.
    ///
    /// Makes up to [`MAX_ATTEMPTS`] admission attempts. RPM or TPM pressure
    /// triggers a jittered exponential backoff sleep (with the lock released);
    /// a spent daily quota fails at once. If every attempt is refused the model
    /// enters cooldown and [`RateLimitErrorKind::RateLimited`] is returned.
    ///
    /// # Errors
    ///
    /// - `ModelInCooldown` if the model is cooling down
    /// - `DailyLimitExceeded` if the model's RPD is spent
    /// - `RateLimited` after all attempts hit RPM/TPM pressure
    /// - `Cancelled` if `cancel` fires while waiting
    /// - `InvalidModel` for an empty model identifier
    #[instrument(skip(self, model, prompt, cancel), fields(model = %model))]
    pub async fn check_limit(
        &self,
        model: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> RateLimitResult<()> {
        let key = normalize_model_key(model);
        if key.is_empty() {
            return Err(RateLimitErrorKind::InvalidModel(model.to_string()).into());
        }
        if cancel.is_cancelled() {
            return Err(RateLimitErrorKind::Cancelled(key).into());
        }

        let config = self.config();
        let limits = config.limits_for(&key);
        let estimated = estimate_tokens(prompt);

        for attempt in 0..MAX_ATTEMPTS {
            let admission = {
                let mut state = self.lock_state();
                let now = Instant::now();
                state.check_cooldown(&key, now)?;

                let window = state
                    .windows
                    .entry(key.clone())
                    .or_insert_with(|| UsageWindow::new(now));
                window.roll(now);
                Self::admit(window, now, estimated, &limits, attempt, config.max_entries)
            };

            match admission {
                Admission::Granted { evicted } => {
                    debug!(attempt, estimated, evicted, "Request admitted");
                    return Ok(());
                }
                Admission::DailyExhausted => {
                    warn!(limit = limits.rpd, "Daily request limit reached");
                    return Err(RateLimitErrorKind::DailyLimitExceeded {
                        model: key,
                        limit: limits.rpd,
                    }
                    .into());
                }
                Admission::Wait { wait, reason } => {
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = MAX_ATTEMPTS,
                        wait_ms = wait.as_millis() as u64,
                        reason,
                        "Quota pressure, backing off"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {}
                        _ = cancel.cancelled() => {
                            info!("Backoff cancelled");
                            return Err(RateLimitErrorKind::Cancelled(key).into());
                        }
                    }
                }
            }
        }

        let cooldown = config.cooldown();
        let until = self.cooldown_key(&key, cooldown);
        warn!(
            attempts = MAX_ATTEMPTS,
            cooldown_secs = cooldown.as_secs(),
            "Rate limit attempts exhausted, model entering cooldown"
        );
        Err(RateLimitErrorKind::RateLimited {
            model: key,
            attempts: MAX_ATTEMPTS,
            cooldown_until: until.into_std(),
            cooldown,
        }
        .into())
    }

    /// Decide one attempt; mutates the window only when granting.
    fn admit(
        window: &mut UsageWindow,
        now: Instant,
        estimated: f64,
        limits: &ModelLimits,
        attempt: u32,
        max_entries: usize,
    ) -> Admission {
        let until_reset = window.remaining_in_window(now) + WINDOW_SLACK;

        if window.current_rpm(now) >= limits.rpm as usize {
            let wait = until_reset.min(backoff(attempt)).min(MAX_RPM_WAIT);
            Admission::Wait { wait, reason: "rpm" }
        } else if window.token_estimate() + estimated > limits.tpm as f64 {
            let wait = until_reset.min(backoff(attempt));
            Admission::Wait { wait, reason: "tpm" }
        } else if window.daily_requests() >= limits.rpd {
            Admission::DailyExhausted
        } else {
            let evicted = window.record(now, estimated, max_entries);
            Admission::Granted { evicted }
        }
    }

    /// Put `model` into cooldown for the configured duration.
    ///
    /// Used by callers that observe quota exhaustion from the provider. Returns
    /// the instant the cooldown ends.
    #[instrument(skip(self))]
    pub fn enter_cooldown(&self, model: &str) -> Instant {
        let key = normalize_model_key(model);
        let cooldown = self.config().cooldown();
        let until = self.cooldown_key(&key, cooldown);
        warn!(cooldown_secs = cooldown.as_secs(), "Model placed into cooldown");
        until
    }

    fn cooldown_key(&self, key: &str, cooldown: Duration) -> Instant {
        let until = Instant::now() + cooldown;
        self.lock_state().cooldowns.insert(key.to_string(), until);
        until
    }

    /// Time left in a model's cooldown, if it is cooling down.
    pub fn cooldown_remaining(&self, model: &str) -> Option<Duration> {
        let key = normalize_model_key(model);
        let now = Instant::now();
        self.lock_state()
            .cooldowns
            .get(&key)
            .filter(|expiry| now < **expiry)
            .map(|expiry| *expiry - now)
    }

    /// Lift a model's cooldown early.
    #[instrument(skip(self))]
    pub fn clear_cooldown(&self, model: &str) -> bool {
        let removed = self
            .lock_state()
            .cooldowns
            .remove(&normalize_model_key(model))
            .is_some();
        if removed {
            info!("Cooldown cleared");
        }
        removed
    }

    /// Current usage counters for a model, if it has been checked before.
    ///
    /// Reset predicates are applied first, so stale minute or day counters read
    /// as zero.
    pub fn usage(&self, model: &str) -> Option<UsageSnapshot> {
        let key = normalize_model_key(model);
        let now = Instant::now();
        let mut state = self.lock_state();
        state.windows.get_mut(&key).map(|window| {
            window.roll(now);
            window.snapshot(now)
        })
    }
}

/// Jittered exponential backoff: `2^attempt + U(0, 0.1)` seconds.
fn backoff(attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.0..0.1);
    Duration::from_secs_f64(2f64.powi(attempt as i32) + jitter)
}
