//! Metrics for rate-limited generation.
//!
//! Provides OpenTelemetry counters for tracking provider calls, failures,
//! fallbacks and cooldowns. Instruments are no-ops until a meter provider
//! is installed globally.

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::OnceLock;

static METRICS: OnceLock<ClientMetrics> = OnceLock::new();

/// Metrics for generation calls made through [`crate::Client`].
///
/// Labeled with provider and model name.
#[derive(Clone)]
pub struct ClientMetrics {
    /// Meter handle kept alive for metric instruments
    _meter: Meter,
    /// Provider calls that returned text
    pub requests: Counter<u64>,
    /// Failed attempts, labeled by failure class
    pub errors: Counter<u64>,
    /// Provider call duration in seconds
    pub duration: Histogram<f64>,
    /// Cascade steps moved to a fallback model
    pub fallbacks: Counter<u64>,
    /// Models placed into cooldown by the client
    pub cooldowns: Counter<u64>,
}

impl ClientMetrics {
    fn init() -> Self {
        let meter = global::meter("cadence_client");

        Self {
            _meter: meter.clone(),
            requests: meter
                .u64_counter("cadence.requests")
                .with_description("Provider calls that returned text")
                .build(),
            errors: meter
                .u64_counter("cadence.errors")
                .with_description("Failed generation attempts")
                .build(),
            duration: meter
                .f64_histogram("cadence.duration")
                .with_unit("s")
                .with_description("Provider call duration")
                .build(),
            fallbacks: meter
                .u64_counter("cadence.fallbacks")
                .with_description("Cascade steps moved to a fallback model")
                .build(),
            cooldowns: meter
                .u64_counter("cadence.cooldowns")
                .with_description("Models placed into cooldown after quota exhaustion")
                .build(),
        }
    }

    /// Get the global client metrics instance.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    /// Record a successful provider call.
    pub fn record_request(&self, provider: &str, model: &str, duration_secs: f64) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
        ];
        self.requests.add(1, labels);
        self.duration.record(duration_secs, labels);
    }

    /// Record a failed attempt.
    pub fn record_error(&self, provider: &str, model: &str, error_type: &'static str) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
            KeyValue::new("error_type", error_type),
        ];
        self.errors.add(1, labels);
    }

    /// Record a move to a fallback model.
    pub fn record_fallback(&self, model: &str) {
        self.fallbacks
            .add(1, &[KeyValue::new("model", model.to_string())]);
    }

    /// Record a model entering cooldown.
    pub fn record_cooldown(&self, model: &str) {
        self.cooldowns
            .add(1, &[KeyValue::new("model", model.to_string())]);
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::get().clone()
    }
}
