//! Configuration structures for rate limiting.
//!
//! This module provides TOML-based configuration for per-model quotas. The
//! configuration system supports:
//! - Bundled defaults (include_str! from cadence.toml)
//! - User overrides (./cadence.toml or ~/.config/cadence/cadence.toml)
//! - Automatic merging with user values taking precedence

use cadence_error::ConfigError;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Quotas for a single model.
///
/// # Example
///
/// ```toml
/// [[models]]
/// name = "gemini-2.5-pro"
/// rpm = 5
/// tpm = 250_000
/// rpd = 100
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ModelLimits {
    /// Requests per minute
    pub rpm: u32,
    /// Estimated tokens per minute
    pub tpm: u64,
    /// Requests per day
    pub rpd: u32,
}

impl ModelLimits {
    /// Create a new set of model limits.
    pub fn new(rpm: u32, tpm: u64, rpd: u32) -> Self {
        Self { rpm, tpm, rpd }
    }
}

impl Default for ModelLimits {
    /// Conservative limits applied to unconfigured models.
    fn default() -> Self {
        Self {
            rpm: 15,
            tpm: 1_000_000,
            rpd: 1500,
        }
    }
}

/// How request entries are dropped when a usage window reaches `max_entries`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvictionPolicy {
    /// Evict the oldest 10% of entries (at least one)
    #[default]
    LruByAge,
}

/// Normalize a model identifier to its lookup key.
///
/// Keeps the last `/`-separated segment and lowercases it, so provider-qualified
/// names share quotas with their bare form.
///
/// ```
/// use cadence_rate_limit::normalize_model_key;
///
/// assert_eq!(normalize_model_key("models/Gemini-2.5-Pro"), "gemini-2.5-pro");
/// assert_eq!(normalize_model_key("gemini-2.0-flash"), "gemini-2.0-flash");
/// ```
pub fn normalize_model_key(model: &str) -> String {
    model
        .trim()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// One `[[models]]` entry as written in TOML.
#[derive(Deserialize, Serialize)]
struct ModelEntry {
    name: String,
    rpm: u32,
    tpm: u64,
    rpd: u32,
}

/// `models` is stored as an array of tables: the `config` crate splits table
/// keys on `.`, and model names contain dots.
mod model_table {
    use super::{ModelEntry, ModelLimits, normalize_model_key};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S>(
        models: &HashMap<String, ModelLimits>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut entries: Vec<ModelEntry> = models
            .iter()
            .map(|(name, limits)| ModelEntry {
                name: name.clone(),
                rpm: limits.rpm,
                tpm: limits.tpm,
                rpd: limits.rpd,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<String, ModelLimits>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<ModelEntry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|e| (normalize_model_key(&e.name), ModelLimits::new(e.rpm, e.tpm, e.rpd)))
            .collect())
    }
}

fn default_cooldown_minutes() -> u64 {
    5
}

fn default_max_entries() -> usize {
    100
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

/// Top-level rate limiter configuration.
///
/// Loads from TOML files with a precedence system:
/// 1. Bundled defaults (include_str! from cadence.toml)
/// 2. User override (~/.config/cadence/cadence.toml, then ./cadence.toml)
///
/// # Example
///
/// ```no_run
/// use cadence_rate_limit::LimiterConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = LimiterConfig::load()?;
/// let limits = config.limits_for("gemini-2.5-pro");
/// println!("gemini-2.5-pro RPM: {}", limits.rpm);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LimiterConfig {
    /// Per-model quota overrides, keyed by normalized model name
    #[serde(default, with = "model_table")]
    pub models: HashMap<String, ModelLimits>,

    /// Quotas for models without an entry in `models`
    #[serde(default)]
    pub default_limits: ModelLimits,

    /// Minutes a model stays unavailable once it enters cooldown
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u64,

    /// Upper bound on tracked request entries per model
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Eviction policy applied at `max_entries`
    #[serde(default)]
    pub eviction_policy: EvictionPolicy,

    /// Model used when the caller does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Models tried, in order, after the requested model fails transiently
    #[serde(default)]
    pub fallback_models: Vec<String>,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            models: HashMap::new(),
            default_limits: ModelLimits::default(),
            cooldown_minutes: default_cooldown_minutes(),
            max_entries: default_max_entries(),
            eviction_policy: EvictionPolicy::default(),
            default_model: default_model(),
            fallback_models: Vec::new(),
        }
    }
}

impl LimiterConfig {
    /// Load configuration from a specific file path.
    ///
    /// Values missing from the file take their built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        debug!("Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override earlier):
    /// 1. Bundled defaults (cadence.toml shipped with the library)
    /// 2. User config in home directory (~/.config/cadence/cadence.toml)
    /// 3. User config in current directory (./cadence.toml)
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> Result<Self, ConfigError> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../cadence.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/cadence/cadence.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("cadence").required(false));

        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Check that every limit and policy value is usable.
    ///
    /// # Errors
    ///
    /// Returns an error for zero `max_entries`, zero `cooldown_minutes`, an empty
    /// `default_model`, or any zero-valued quota.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::new("max_entries must be greater than zero"));
        }
        if self.cooldown_minutes == 0 {
            return Err(ConfigError::new("cooldown_minutes must be greater than zero"));
        }
        if normalize_model_key(&self.default_model).is_empty() {
            return Err(ConfigError::new("default_model must not be empty"));
        }

        let all_limits = std::iter::once(("default_limits", &self.default_limits))
            .chain(self.models.iter().map(|(name, l)| (name.as_str(), l)));
        for (name, limits) in all_limits {
            if limits.rpm == 0 || limits.tpm == 0 || limits.rpd == 0 {
                return Err(ConfigError::new(format!(
                    "Limits for '{}' must all be greater than zero (rpm={}, tpm={}, rpd={})",
                    name, limits.rpm, limits.tpm, limits.rpd
                )));
            }
        }
        Ok(())
    }

    /// Resolve the quotas for a model, falling back to `default_limits`.
    ///
    /// Lookup uses [`normalize_model_key`] on both the requested name and the
    /// configured keys.
    pub fn limits_for(&self, model: &str) -> ModelLimits {
        let key = normalize_model_key(model);
        self.models
            .get(&key)
            .or_else(|| {
                self.models
                    .iter()
                    .find(|(name, _)| normalize_model_key(name) == key)
                    .map(|(_, limits)| limits)
            })
            .copied()
            .unwrap_or(self.default_limits)
    }

    /// Cooldown length as a duration.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_minutes.saturating_mul(60))
    }

    /// Add or replace the quotas for one model.
    pub fn with_model(mut self, model: impl AsRef<str>, limits: ModelLimits) -> Self {
        self.models
            .insert(normalize_model_key(model.as_ref()), limits);
        self
    }

    /// Replace the fallback model list.
    pub fn with_fallbacks<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Set the cooldown length in minutes.
    pub fn with_cooldown_minutes(mut self, minutes: u64) -> Self {
        self.cooldown_minutes = minutes;
        self
    }

    /// Set the per-model entry bound.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the model used when callers do not name one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }
}
