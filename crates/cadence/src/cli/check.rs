//! `cadence check` handler.

use cadence::{LimiterConfig, RateLimitErrorKind, RateLimiter, estimate_tokens};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Outcome of a `cadence check` run.
#[derive(Debug)]
pub struct CheckSummary {
    /// Checks that were granted
    pub granted: u32,
    /// The refusal that ended the run, if any
    pub refused: Option<RateLimitErrorKind>,
}

/// Run up to `count` limit checks for `model` and print each outcome.
///
/// Stops at the first refusal: once the model is rate limited, in cooldown or
/// out of daily quota every further check would fail the same way. `cancel`
/// aborts any backoff in progress.
pub async fn run_checks(
    config: LimiterConfig,
    model: &str,
    prompt: &str,
    count: u32,
    cancel: &CancellationToken,
) -> CheckSummary {
    let limiter = RateLimiter::new(config);
    let limits = limiter.limits_for(model);
    info!(
        model,
        rpm = limits.rpm,
        tpm = limits.tpm,
        rpd = limits.rpd,
        tokens = estimate_tokens(prompt),
        "Starting limit checks"
    );

    let started = Instant::now();
    let mut summary = CheckSummary {
        granted: 0,
        refused: None,
    };
    for i in 1..=count {
        let requested = Instant::now();
        match limiter.check_limit(model, prompt, cancel).await {
            Ok(()) => {
                summary.granted += 1;
                let waited = requested.elapsed().as_secs_f64();
                match limiter.usage(model) {
                    Some(usage) => println!(
                        "#{i:<4} granted after {waited:>6.2}s  rpm={} tokens={:.2} daily={}",
                        usage.current_rpm, usage.token_estimate, usage.daily_requests
                    ),
                    None => println!("#{i:<4} granted after {waited:>6.2}s"),
                }
            }
            Err(e) => {
                println!("#{i:<4} refused: {}", e.kind);
                summary.refused = Some(e.kind);
                break;
            }
        }
    }

    println!("finished in {:.2}s", started.elapsed().as_secs_f64());
    if let Some(remaining) = limiter.cooldown_remaining(model) {
        println!("{model} in cooldown for {}s", remaining.as_secs());
    }
    summary
}
