// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{urls, FakeTransport};
use agentscrape::domain::models::cancel_token::CancelToken;
use agentscrape::engines::fetcher::BoundedFetcher;
use agentscrape::engines::traits::FetchError;
use agentscrape::utils::retry_policy::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_one_outcome_per_url_in_input_order() {
    let transport = Arc::new(
        FakeTransport::new()
            .with_delay(Duration::from_millis(20))
            .with_page("https://c", 404, "missing"),
    );
    let fetcher = BoundedFetcher::new(transport.clone(), RetryPolicy::default());
    let input = urls(&["https://a", "https://b", "https://a", "https://c"]);

    let outcomes = fetcher
        .fetch_all(&input, 3, Duration::from_secs(1), &CancelToken::none())
        .await;

    assert_eq!(outcomes.len(), input.len());
    for (outcome, url) in outcomes.iter().zip(&input) {
        assert_eq!(&outcome.url, url);
    }
    assert_eq!(transport.calls_for("https://a"), 2);
    assert_eq!(outcomes[3].result, Err(FetchError::HttpStatus(404)));
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_ceiling_is_respected() {
    let transport = Arc::new(FakeTransport::new().with_delay(Duration::from_millis(50)));
    let fetcher = BoundedFetcher::new(transport.clone(), RetryPolicy::default());
    let input: Vec<String> = (0..10).map(|i| format!("https://site/{}", i)).collect();

    let outcomes = fetcher
        .fetch_all(&input, 2, Duration::from_secs(1), &CancelToken::none())
        .await;

    assert_eq!(outcomes.len(), 10);
    assert!(outcomes.iter().all(|o| o.is_success()));
    assert_eq!(transport.calls(), 10);
    assert!(transport.max_in_flight() <= 2);
    assert_eq!(transport.max_in_flight(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_large_batch_stays_bounded() {
    let transport = Arc::new(FakeTransport::new().with_delay(Duration::from_millis(5)));
    let fetcher = BoundedFetcher::new(transport.clone(), RetryPolicy::default());
    let input: Vec<String> = (0..2_000).map(|i| format!("https://bulk/{}", i)).collect();

    let outcomes = fetcher
        .fetch_all(&input, 8, Duration::from_secs(1), &CancelToken::none())
        .await;

    assert_eq!(outcomes.len(), 2_000);
    assert!(transport.max_in_flight() <= 8);
}

#[tokio::test(start_paused = true)]
async fn test_retry_ceiling_is_respected() {
    let transport = Arc::new(
        FakeTransport::new()
            .with_failure("https://down", FetchError::Transport("connection reset".into())),
    );
    let fetcher = BoundedFetcher::new(transport.clone(), RetryPolicy::default());
    let started = tokio::time::Instant::now();

    let outcomes = fetcher
        .fetch_all(&urls(&["https://down"]), 1, Duration::from_secs(1), &CancelToken::none())
        .await;

    assert_eq!(
        outcomes[0].result,
        Err(FetchError::Transport("connection reset".into()))
    );
    assert_eq!(outcomes[0].attempts, 3);
    assert_eq!(transport.calls_for("https://down"), 3);
    // 两次固定间隔的等待
    assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_failing_url_does_not_abort_siblings() {
    let transport = Arc::new(
        FakeTransport::new()
            .with_failure("https://down", FetchError::Timeout)
            .with_page("https://bad", 400, "bad request"),
    );
    let fetcher = BoundedFetcher::new(transport.clone(), RetryPolicy::default());

    let outcomes = fetcher
        .fetch_all(
            &urls(&["https://down", "https://ok", "https://bad"]),
            2,
            Duration::from_secs(1),
            &CancelToken::none(),
        )
        .await;

    assert_eq!(outcomes[0].result, Err(FetchError::Timeout));
    assert!(outcomes[1].is_success());
    assert_eq!(outcomes[2].result, Err(FetchError::HttpStatus(400)));
    assert_eq!(outcomes[2].attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_is_checked_before_next_retry() {
    let transport = Arc::new(
        FakeTransport::new().with_failure("https://down", FetchError::HttpStatus(503)),
    );
    let fetcher = BoundedFetcher::new(transport.clone(), RetryPolicy::default());
    let observed = transport.clone();
    let token = CancelToken::from_predicate(move || observed.calls() >= 1);

    let outcomes = fetcher
        .fetch_all(&urls(&["https://down"]), 1, Duration::from_secs(1), &token)
        .await;

    assert!(outcomes[0].is_canceled());
    assert_eq!(outcomes[0].attempts, 1);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_transport_times_out_per_request() {
    let transport = Arc::new(FakeTransport::new().with_delay(Duration::from_secs(5)));
    let fetcher = BoundedFetcher::new(
        transport.clone(),
        RetryPolicy::fixed(2, Duration::from_millis(10)),
    );

    let outcomes = fetcher
        .fetch_all(&urls(&["https://slow"]), 1, Duration::from_millis(100), &CancelToken::none())
        .await;

    assert_eq!(outcomes[0].result, Err(FetchError::Timeout));
    assert_eq!(outcomes[0].attempts, 2);
}
