//! Per-model usage counters with minute and day reset boundaries.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Length of the RPM/TPM window.
pub const MINUTE_WINDOW: Duration = Duration::from_secs(60);

/// Length of the RPD window.
pub const DAY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// One granted request and the tokens it was charged.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    at: Instant,
    tokens: f64,
}

/// Point-in-time view of a model's usage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageSnapshot {
    /// Requests granted within the last 60 seconds
    pub current_rpm: usize,
    /// Estimated tokens charged in the current minute window
    pub token_estimate: f64,
    /// Requests granted in the current day window
    pub daily_requests: u32,
    /// Request entries currently tracked
    pub entries: usize,
}

/// Mutable counters for one model.
///
/// Entries are filtered by recency when counted rather than pruned eagerly;
/// they are only dropped by a minute reset or by eviction at `max_entries`.
#[derive(Debug, Clone)]
pub struct UsageWindow {
    entries: VecDeque<Entry>,
    token_estimate: f64,
    daily_requests: u32,
    window_start: Instant,
    day_start: Instant,
}

impl UsageWindow {
    /// Create an empty window whose minute and day both start at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            entries: VecDeque::new(),
            token_estimate: 0.0,
            daily_requests: 0,
            window_start: now,
            day_start: now,
        }
    }

    /// Apply the minute and day reset predicates.
    ///
    /// The minute counters reset when more than 60s have passed since
    /// `window_start`; the daily count resets when more than 24h have passed
    /// since `day_start`.
    pub fn roll(&mut self, now: Instant) {
        if now.saturating_duration_since(self.window_start) > MINUTE_WINDOW {
            trace!(
                dropped = self.entries.len(),
                tokens = self.token_estimate,
                "Minute window reset"
            );
            self.entries.clear();
            self.token_estimate = 0.0;
            self.window_start = now;
        }
        if now.saturating_duration_since(self.day_start) > DAY_WINDOW {
            trace!(daily_requests = self.daily_requests, "Day window reset");
            self.daily_requests = 0;
            self.day_start = now;
        }
    }

    /// Requests granted within the last 60 seconds.
    pub fn current_rpm(&self, now: Instant) -> usize {
        self.entries
            .iter()
            .filter(|entry| now.saturating_duration_since(entry.at) < MINUTE_WINDOW)
            .count()
    }

    /// Time left before the minute window resets.
    pub fn remaining_in_window(&self, now: Instant) -> Duration {
        MINUTE_WINDOW.saturating_sub(now.saturating_duration_since(self.window_start))
    }

    /// Estimated tokens charged in the current minute window.
    pub fn token_estimate(&self) -> f64 {
        self.token_estimate
    }

    /// Requests granted in the current day window.
    pub fn daily_requests(&self) -> u32 {
        self.daily_requests
    }

    /// Number of tracked request entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no request entries are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a granted request, evicting first if the window is at capacity.
    ///
    /// Returns the number of entries evicted.
    pub fn record(&mut self, now: Instant, tokens: f64, max_entries: usize) -> usize {
        let evicted = if self.entries.len() >= max_entries {
            self.evict_oldest()
        } else {
            0
        };

        self.entries.push_back(Entry { at: now, tokens });
        self.token_estimate += tokens;
        self.daily_requests = self.daily_requests.saturating_add(1);
        evicted
    }

    /// Drop the oldest 10% of entries (at least one), refunding their tokens.
    fn evict_oldest(&mut self) -> usize {
        let count = (self.entries.len() / 10).max(1).min(self.entries.len());
        for entry in self.entries.drain(..count) {
            self.token_estimate = (self.token_estimate - entry.tokens).max(0.0);
        }
        trace!(count, remaining = self.entries.len(), "Evicted oldest entries");
        count
    }

    /// Capture the current counters.
    pub fn snapshot(&self, now: Instant) -> UsageSnapshot {
        UsageSnapshot {
            current_rpm: self.current_rpm(now),
            token_estimate: self.token_estimate,
            daily_requests: self.daily_requests,
            entries: self.entries.len(),
        }
    }
}
