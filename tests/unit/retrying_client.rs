//! Unit tests for RetryingClient timeout and backoff behaviour

use bidplus_fetcher::downloader::config::RetryPolicy;
use bidplus_fetcher::events::FetchEvent;
use bidplus_fetcher::fetcher::http::RetryingClient;
use bidplus_fetcher::fetcher::{FetcherError, PortalRequest};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::support::sink::RecordingSink;
use crate::support::transport::{Reply, ScriptedTransport};

fn request() -> PortalRequest {
    PortalRequest::get("http://portal.test/search-bids")
}

#[tokio::test(start_paused = true)]
async fn test_backoff_delays_before_each_retry() {
    let transport = ScriptedTransport::new(|_| Reply::NetworkError);
    let sink = Arc::new(RecordingSink::new());
    let client = RetryingClient::new(transport.clone(), RetryPolicy::default()).with_events(sink.clone());

    let result = client.send(&request()).await;

    assert!(matches!(result, Err(FetcherError::NetworkError(_))));
    assert_eq!(transport.request_count(), 3);
    assert_eq!(
        sink.retry_delays(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
    assert!(sink.events().iter().any(|event| matches!(
        event,
        FetchEvent::RequestFailed { attempts: 3, .. }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_request_times_out_every_attempt() {
    let transport = ScriptedTransport::new(|_| Reply::Hang);
    let client = RetryingClient::new(transport.clone(), RetryPolicy::default());

    let started = Instant::now();
    let result = client.send(&request()).await;
    let elapsed = started.elapsed();

    assert_eq!(
        result.unwrap_err(),
        FetcherError::Timeout(Duration::from_secs(20))
    );
    assert_eq!(transport.request_count(), 3);
    // 3 × 20s timeouts plus 1s and 2s of backoff
    assert!(elapsed >= Duration::from_secs(63), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(64), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_one_timeout() {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = ScriptedTransport::new({
        let calls = calls.clone();
        move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Reply::Hang
            } else {
                Reply::Json(json!({"ok": true}))
            }
        }
    });
    let client = RetryingClient::new(transport.clone(), RetryPolicy::default());

    let started = Instant::now();
    let response = client.send(&request()).await.unwrap();

    assert!(response.is_success());
    assert_eq!(transport.request_count(), 2);
    assert!(started.elapsed() >= Duration::from_secs(21));
    assert!(started.elapsed() < Duration::from_secs(22));
}

#[tokio::test(start_paused = true)]
async fn test_error_status_returned_without_retry() {
    let transport = ScriptedTransport::new(|_| Reply::Status(503));
    let client = RetryingClient::new(transport.clone(), RetryPolicy::default());

    let response = client.send(&request()).await.unwrap();

    assert_eq!(response.status.as_u16(), 503);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_attempts_sends_once() {
    let transport = ScriptedTransport::new(|_| Reply::NetworkError);
    let policy = RetryPolicy::new(0, Duration::from_secs(1), Duration::from_secs(20));
    let client = RetryingClient::new(transport.clone(), policy);

    assert!(client.send(&request()).await.is_err());
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_custom_policy_is_respected() {
    let transport = ScriptedTransport::new(|_| Reply::NetworkError);
    let sink = Arc::new(RecordingSink::new());
    let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_secs(1));
    let client = RetryingClient::new(transport.clone(), policy).with_events(sink.clone());

    assert!(client.send(&request()).await.is_err());
    assert_eq!(transport.request_count(), 5);
    assert_eq!(
        sink.retry_delays(),
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400),
            Duration::from_millis(800),
        ]
    );
}
