//! Test utilities for Cadence client tests.
//!
//! Provides a scripted provider whose responses are queued per model.

use async_trait::async_trait;
use cadence_client::{Client, GenerateOptions, Generator};
use cadence_error::ProviderError;
use cadence_rate_limit::{LimiterConfig, RateLimiter};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// What the mock returns for one call.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockResponse {
    /// Return this text
    Text(String),
    /// Fail with a raw provider message, classified at the boundary
    Raw(String),
    /// Never complete (for cancellation tests)
    Hang,
}

/// Provider that replays queued responses per model and logs every call.
///
/// When a model's queue is empty, the model's sticky response (if any) is
/// repeated; otherwise the call fails with a generic API error.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    queues: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    sticky: Mutex<HashMap<String, MockResponse>>,
    calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for `model`.
    pub fn then(self, model: &str, response: MockResponse) -> Self {
        self.queues
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Response returned for `model` once its queue is empty.
    pub fn always(self, model: &str, response: MockResponse) -> Self {
        self.sticky
            .lock()
            .unwrap()
            .insert(model.to_string(), response);
        self
    }

    /// Models called, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        model: &str,
        _prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(model.to_string());

        let response = {
            let queued = self
                .queues
                .lock()
                .unwrap()
                .get_mut(model)
                .and_then(VecDeque::pop_front);
            queued.or_else(|| self.sticky.lock().unwrap().get(model).cloned())
        };

        match response {
            Some(MockResponse::Text(text)) => Ok(text),
            Some(MockResponse::Raw(raw)) => Err(ProviderError::from_raw(raw)),
            Some(MockResponse::Hang) => std::future::pending().await,
            None => Err(ProviderError::from_raw(format!("no script for {model}"))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Build a client over a fresh limiter with `default_model` and fallbacks.
#[allow(dead_code)]
pub fn client_with(
    generator: Arc<ScriptedGenerator>,
    default_model: &str,
    fallbacks: &[&str],
) -> Client {
    let config = LimiterConfig::default()
        .with_default_model(default_model)
        .with_fallbacks(fallbacks.iter().copied());
    client_with_config(generator, config)
}

/// Build a client over a fresh limiter with an explicit configuration.
#[allow(dead_code)]
pub fn client_with_config(generator: Arc<ScriptedGenerator>, config: LimiterConfig) -> Client {
    Client::new(Arc::new(RateLimiter::new(config)), generator)
}
