//! Tests for the retry and fallback cascade using a scripted provider.

mod test_utils;

use cadence_client::GenerateOptions;
use cadence_error::{AttemptError, ProviderErrorKind, RateLimitErrorKind};
use cadence_rate_limit::{LimiterConfig, ModelLimits};
use std::sync::Arc;
use std::time::Duration;
use test_utils::{MockResponse, ScriptedGenerator, client_with, client_with_config};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn rate_limited() -> MockResponse {
    MockResponse::Raw("429 rate limit exceeded for model".to_string())
}

fn text(s: &str) -> MockResponse {
    MockResponse::Text(s.to_string())
}

#[tokio::test(start_paused = true)]
async fn fallbacks_are_tried_in_order_after_same_model_retry() -> anyhow::Result<()> {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .always("p", rate_limited())
            .always("m1", rate_limited())
            .always("m2", text("from m2")),
    );
    let client = client_with(Arc::clone(&generator), "p", &["m1", "m2"]);

    let out = client
        .generate("hi", Some("p"), 3, &GenerateOptions::default(), &CancellationToken::new())
        .await?;

    assert_eq!(out, "from m2");
    assert_eq!(generator.calls(), ["p", "p", "m1", "m2"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn same_model_retry_can_succeed() -> anyhow::Result<()> {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .then("p", rate_limited())
            .then("p", text("second time")),
    );
    let client = client_with(Arc::clone(&generator), "p", &["m1"]);

    let out = client
        .generate("hi", None, 3, &GenerateOptions::default(), &CancellationToken::new())
        .await?;

    assert_eq!(out, "second time");
    assert_eq!(generator.calls(), ["p", "p"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn saturated_retry_falls_through_to_fallback() -> anyhow::Result<()> {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .always("p", rate_limited())
            .always("m1", text("from m1")),
    );
    let config = LimiterConfig::default()
        .with_default_model("p")
        .with_fallbacks(["m1"])
        .with_model("p", ModelLimits::new(1, 1_000_000, 100));
    let client = client_with_config(Arc::clone(&generator), config);

    let out = client
        .generate("hi", None, 3, &GenerateOptions::default(), &CancellationToken::new())
        .await?;

    // The retry is refused by the limiter (rpm=1 already spent), which must
    // not keep the fallback from being tried.
    assert_eq!(out, "from m1");
    assert_eq!(generator.calls(), ["p", "m1"]);
    assert!(client.limiter().cooldown_remaining("p").is_some());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn hard_error_on_retry_falls_through_to_fallback() -> anyhow::Result<()> {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .then("p", rate_limited())
            .then("p", MockResponse::Raw("500 internal".to_string()))
            .always("m1", text("from m1")),
    );
    let client = client_with(Arc::clone(&generator), "p", &["m1"]);

    let out = client
        .generate("hi", None, 3, &GenerateOptions::default(), &CancellationToken::new())
        .await?;

    assert_eq!(out, "from m1");
    assert_eq!(generator.calls(), ["p", "p", "m1"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn exhausted_cascade_reports_every_attempt() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .always("p", rate_limited())
            .always("m1", rate_limited())
            .always("m2", MockResponse::Raw("RPM exceeded".to_string())),
    );
    let client = client_with(Arc::clone(&generator), "p", &["m1", "m2"]);

    let err = client
        .generate("hi", None, 3, &GenerateOptions::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.models(), ["p", "p", "m1", "m2"]);
    for attempt in err.attempts() {
        assert!(matches!(
            &attempt.error,
            AttemptError::Provider(e) if matches!(e.kind, ProviderErrorKind::RateLimit(_))
        ));
    }
    let source = std::error::Error::source(&err).expect("last failure is the source");
    assert!(source.to_string().contains("RPM exceeded"));
}

#[tokio::test(start_paused = true)]
async fn empty_response_is_treated_as_transient() -> anyhow::Result<()> {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .then("p", text("   "))
            .then("p", text(""))
            .always("m1", text("fallback text")),
    );
    let client = client_with(Arc::clone(&generator), "p", &["m1"]);

    let out = client
        .generate("hi", None, 3, &GenerateOptions::default(), &CancellationToken::new())
        .await?;

    assert_eq!(out, "fallback text");
    assert_eq!(generator.calls(), ["p", "p", "m1"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn quota_error_cools_model_down_and_stops() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .always("p", MockResponse::Raw("Quota exceeded for project".to_string()))
            .always("m1", text("unused")),
    );
    let client = client_with(Arc::clone(&generator), "p", &["m1"]);
    let cancel = CancellationToken::new();

    let err = client
        .generate("hi", None, 3, &GenerateOptions::default(), &cancel)
        .await
        .unwrap_err();

    assert_eq!(generator.calls(), ["p"]);
    assert!(matches!(
        &err.last().expect("one attempt").error,
        AttemptError::Provider(e) if matches!(e.kind, ProviderErrorKind::QuotaExhausted(_))
    ));
    assert!(client.limiter().cooldown_remaining("p").is_some());

    // The next call is refused by the limiter without reaching the provider.
    let err = client
        .generate("hi", None, 3, &GenerateOptions::default(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        &err.last().expect("one attempt").error,
        AttemptError::Limiter(e) if matches!(e.kind, RateLimitErrorKind::ModelInCooldown { .. })
    ));
    assert_eq!(generator.calls(), ["p"]);
}

#[tokio::test(start_paused = true)]
async fn quota_on_fallback_cools_it_down_and_moves_on() -> anyhow::Result<()> {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .always("p", rate_limited())
            .always("m1", MockResponse::Raw("quota exhausted".to_string()))
            .always("m2", text("ok")),
    );
    let client = client_with(Arc::clone(&generator), "p", &["m1", "m2"]);

    let out = client
        .generate("hi", None, 3, &GenerateOptions::default(), &CancellationToken::new())
        .await?;

    assert_eq!(out, "ok");
    assert!(client.limiter().cooldown_remaining("m1").is_some());
    assert!(client.limiter().cooldown_remaining("p").is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn fallback_in_cooldown_is_skipped() -> anyhow::Result<()> {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .always("p", rate_limited())
            .always("m1", text("never"))
            .always("m2", text("ok")),
    );
    let client = client_with(Arc::clone(&generator), "p", &["m1", "m2"]);
    client.limiter().enter_cooldown("m1");

    let out = client
        .generate("hi", None, 3, &GenerateOptions::default(), &CancellationToken::new())
        .await?;

    assert_eq!(out, "ok");
    assert_eq!(generator.calls(), ["p", "p", "m2"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn primary_in_cooldown_fails_without_fallback() {
    let generator = Arc::new(ScriptedGenerator::new().always("m1", text("unused")));
    let client = client_with(Arc::clone(&generator), "p", &["m1"]);
    client.limiter().enter_cooldown("p");

    let err = client
        .generate("hi", None, 3, &GenerateOptions::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.models(), ["p"]);
    assert!(generator.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn too_many_requests_retries_same_model_with_backoff() -> anyhow::Result<()> {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .then("p", MockResponse::Raw("HTTP 429".to_string()))
            .then("p", MockResponse::Raw("HTTP 429".to_string()))
            .then("p", text("finally")),
    );
    let client = client_with(Arc::clone(&generator), "p", &["m1"]);

    let start = Instant::now();
    let out = client
        .generate("hi", None, 2, &GenerateOptions::default(), &CancellationToken::new())
        .await?;

    assert_eq!(out, "finally");
    assert_eq!(generator.calls(), ["p", "p", "p"]);
    // 2^1 + U(0.1, 55) then 2^2 + U(0.1, 55)
    let waited = start.elapsed();
    assert!(waited >= Duration::from_secs_f64(6.2), "waited {waited:?}");
    assert!(waited < Duration::from_secs(116), "waited {waited:?}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn too_many_requests_without_retries_is_terminal() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .always("p", MockResponse::Raw("429".to_string()))
            .always("m1", text("unused")),
    );
    let client = client_with(Arc::clone(&generator), "p", &["m1"]);

    let start = Instant::now();
    let err = client
        .generate("hi", None, 0, &GenerateOptions::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(generator.calls(), ["p"]);
    assert!(matches!(
        &err.last().expect("one attempt").error,
        AttemptError::Provider(e) if matches!(e.kind, ProviderErrorKind::TooManyRequests(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn other_provider_errors_are_terminal() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .always("p", MockResponse::Raw("400 invalid argument".to_string()))
            .always("m1", text("unused")),
    );
    let client = client_with(Arc::clone(&generator), "p", &["m1"]);

    let err = client
        .generate("hi", None, 3, &GenerateOptions::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.models(), ["p"]);
    assert_eq!(generator.calls(), ["p"]);
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_in_flight_call() {
    let generator = Arc::new(ScriptedGenerator::new().always("p", MockResponse::Hang));
    let client = Arc::new(client_with(Arc::clone(&generator), "p", &["m1"]));
    let cancel = CancellationToken::new();

    let task = {
        let client = Arc::clone(&client);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            client
                .generate("hi", None, 3, &GenerateOptions::default(), &cancel)
                .await
        })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();

    let err = task.await.expect("task completes").unwrap_err();
    assert_eq!(err.models(), ["p"]);
    assert!(matches!(
        &err.last().expect("one attempt").error,
        AttemptError::Provider(e) if e.kind == ProviderErrorKind::Cancelled
    ));
}

#[tokio::test(start_paused = true)]
async fn successful_calls_consume_limiter_quota() -> anyhow::Result<()> {
    let generator = Arc::new(ScriptedGenerator::new().always("p", text("ok")));
    let client = client_with(Arc::clone(&generator), "p", &[]);
    let cancel = CancellationToken::new();

    for _ in 0..3 {
        client
            .generate("a b c d", None, 3, &GenerateOptions::default(), &cancel)
            .await?;
    }

    let usage = client.limiter().usage("p").expect("window exists");
    assert_eq!(usage.daily_requests, 3);
    assert!((usage.token_estimate - 3.0 * 5.32).abs() < 1e-9);
    Ok(())
}
