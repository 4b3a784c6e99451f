//! Integration tests for logging and the event stream consumers

use bidplus_fetcher::events::{self, log_event, EventSink, FetchEvent, TracingSink};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Shared in-memory log destination
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a scoped subscriber writing into the returned buffer
fn capture_logs(json: bool, f: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("bidplus_fetcher=trace"))
        .with_ansi(false)
        .with_writer(move || writer.clone());

    if json {
        tracing::subscriber::with_default(builder.json().finish(), f);
    } else {
        tracing::subscriber::with_default(builder.finish(), f);
    }
    logs.text()
}

fn sample_events() -> Vec<FetchEvent> {
    vec![
        FetchEvent::RunStarted {
            categories: 2,
            batches: 1,
        },
        FetchEvent::BatchStarted {
            batch: 1,
            total_batches: 1,
            categories: vec!["A".to_string(), "B".to_string()],
        },
        FetchEvent::RetryScheduled {
            url: "http://portal.test/search-bids".to_string(),
            attempt: 1,
            max_attempts: 3,
            delay: Duration::from_secs(1),
            error: "request timed out after 20s".to_string(),
        },
        FetchEvent::PageFetched {
            category: "A".to_string(),
            page: 1,
            bids: 10,
            total_matches: 15,
        },
        FetchEvent::CategoryCompleted {
            category: "A".to_string(),
            bids: 15,
            pages: 2,
        },
        FetchEvent::CategoryFailed {
            category: "B".to_string(),
            page: 1,
            reason: "request timed out after 20s".to_string(),
        },
        FetchEvent::BatchFinished {
            batch: 1,
            total_batches: 1,
        },
        FetchEvent::RunFinished {
            total_categories: 2,
            categories_with_bids: 1,
            total_bids: 15,
            failed_categories: 1,
        },
    ]
}

#[test]
fn test_tracing_sink_logs_every_event() {
    let logs = capture_logs(false, || {
        let sink = TracingSink;
        for event in sample_events() {
            sink.emit(event);
        }
    });

    assert!(logs.contains("Fetching bids"), "logs: {logs}");
    assert!(logs.contains("categories=2"));
    assert!(logs.contains("Attempt 1/3 failed, retrying in 1s"));
    assert!(logs.contains("backoff_ms=1000"));
    assert!(logs.contains("Category fetch failed"));
    assert!(logs.contains("reason=request timed out after 20s"));
    assert!(logs.contains("total_bids=15"));
}

#[test]
fn test_run_start_logged_once() {
    let logs = capture_logs(false, || {
        log_event(&FetchEvent::RunStarted {
            categories: 34,
            batches: 17,
        });
    });

    assert_eq!(logs.lines().count(), 1, "logs: {logs}");
    assert!(logs.contains("INFO"));
    assert!(logs.contains("categories=34 batches=17"));
}

#[test]
fn test_json_logs_carry_structured_fields() {
    let logs = capture_logs(true, || {
        log_event(&FetchEvent::CategoryCompleted {
            category: "Cloud Service".to_string(),
            bids: 25,
            pages: 3,
        });
    });

    let line: serde_json::Value = serde_json::from_str(logs.trim()).unwrap();
    assert_eq!(line["level"], "INFO");
    assert_eq!(line["fields"]["message"], "Category complete");
    assert_eq!(line["fields"]["category"], "Cloud Service");
    assert_eq!(line["fields"]["bids"], 25);
    assert_eq!(line["fields"]["pages"], 3);
}

#[test]
fn test_filter_drops_debug_events() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("bidplus_fetcher=info"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        log_event(&FetchEvent::CategoryEmpty {
            category: "Laptop".to_string(),
        });
    });

    assert!(logs.text().is_empty());
}

#[tokio::test]
async fn test_channel_consumer_sees_events_in_order() {
    let (sink, mut receiver) = events::channel();
    let consumer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(event) = receiver.recv().await {
            log_event(&event);
            seen.push(event);
        }
        seen
    });

    for event in sample_events() {
        sink.emit(event);
    }
    drop(sink);

    let seen = consumer.await.unwrap();
    assert_eq!(seen, sample_events());
}
