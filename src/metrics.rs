//! Observability metrics for bid fetch runs
//!
//! Metrics are derived from the [`FetchEvent`] stream: [`record_event`] turns
//! each event into counter, histogram and gauge updates. Nothing in the fetch
//! path touches the `metrics` crate directly.
//!
//! ## Architecture
//!
//! - Uses `metrics` crate for low-overhead metric collection
//! - Prometheus exporter for the scrape endpoint (e.g. `:9090/metrics`)
//! - Without an installed recorder every update is a no-op

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::events::FetchEvent;

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Initialize metrics system with Prometheus exporter
///
/// This should be called once at application startup. The function is
/// idempotent and will not reinitialize if already called.
///
/// # Arguments
/// * `addr` - Socket address to bind Prometheus scrape endpoint (e.g., "0.0.0.0:9090")
///
/// # Returns
/// Ok(()) if metrics initialized successfully, Err if binding fails
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "portal_retries_total",
        Unit::Count,
        "Total number of retry attempts against the portal"
    );

    describe_histogram!(
        "retry_backoff_duration_seconds",
        Unit::Seconds,
        "Duration of retry backoff in seconds"
    );

    describe_counter!(
        "portal_requests_failed_total",
        Unit::Count,
        "Requests that failed after exhausting retries"
    );

    describe_counter!(
        "pages_fetched_total",
        Unit::Count,
        "Search result pages fetched"
    );

    describe_counter!(
        "bids_collected_total",
        Unit::Count,
        "Bids projected from search results"
    );

    describe_counter!(
        "categories_completed_total",
        Unit::Count,
        "Categories finished, labelled by status (found, empty, failed)"
    );

    describe_counter!(
        "batches_completed_total",
        Unit::Count,
        "Category batches finished"
    );

    describe_gauge!(
        "last_run_total_bids",
        Unit::Count,
        "Bids collected by the most recent run"
    );

    describe_gauge!(
        "last_run_failed_categories",
        Unit::Count,
        "Categories that failed in the most recent run"
    );

    describe_histogram!(
        "fetch_run_duration_seconds",
        Unit::Seconds,
        "Wall-clock duration of a whole fetch run"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Update metrics for one fetch event
pub fn record_event(event: &FetchEvent) {
    match event {
        FetchEvent::RetryScheduled { attempt, delay, .. } => {
            counter!("portal_retries_total", "attempt" => attempt.to_string()).increment(1);
            histogram!("retry_backoff_duration_seconds", "attempt" => attempt.to_string())
                .record(delay.as_secs_f64());
        }
        FetchEvent::RequestFailed { .. } => {
            counter!("portal_requests_failed_total").increment(1);
        }
        FetchEvent::PageFetched { bids, .. } => {
            counter!("pages_fetched_total").increment(1);
            counter!("bids_collected_total").increment(*bids as u64);
        }
        FetchEvent::CategoryCompleted { .. } => {
            counter!("categories_completed_total", "status" => "found").increment(1);
        }
        FetchEvent::CategoryEmpty { .. } => {
            counter!("categories_completed_total", "status" => "empty").increment(1);
        }
        FetchEvent::CategoryFailed { .. } => {
            counter!("categories_completed_total", "status" => "failed").increment(1);
        }
        FetchEvent::BatchFinished { .. } => {
            counter!("batches_completed_total").increment(1);
        }
        FetchEvent::RunFinished {
            total_bids,
            failed_categories,
            ..
        } => {
            gauge!("last_run_total_bids").set(*total_bids as f64);
            gauge!("last_run_failed_categories").set(*failed_categories as f64);
        }
        FetchEvent::RunStarted { .. }
        | FetchEvent::BatchStarted { .. }
        | FetchEvent::PageLimitReached { .. } => {}
    }
}

/// Times a whole fetch run
pub struct RunMetrics {
    start_time: Instant,
}

impl RunMetrics {
    /// Start timing
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Record the run duration
    pub fn record_finished(&self) {
        let duration = self.start_time.elapsed();
        histogram!("fetch_run_duration_seconds").record(duration.as_secs_f64());
        debug!(duration_ms = duration.as_millis() as u64, "Fetch run duration recorded");
    }
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}
