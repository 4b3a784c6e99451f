//! Structured fetch events
//!
//! The retrying client, the category fetcher, the batch executor and the
//! collector never log directly. They emit [`FetchEvent`]s into an
//! [`EventSink`]; logging ([`TracingSink`], [`log_event`]), metrics
//! ([`crate::metrics::record_event`]) and the CLI progress bar consume them.
//!
//! Sinks must not block: `emit` is called from inside the fetch loop.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Something observable that happened during a fetch run
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// A run over the catalog is starting
    RunStarted {
        /// Number of categories in the catalog
        categories: usize,
        /// Number of batches the categories were split into
        batches: usize,
    },
    /// A batch of categories is about to be fetched concurrently
    BatchStarted {
        /// One-based batch number
        batch: usize,
        /// Total number of batches
        total_batches: usize,
        /// Names of the categories in this batch
        categories: Vec<String>,
    },
    /// A request attempt failed and will be retried after `delay`
    RetryScheduled {
        /// Request URL
        url: String,
        /// One-based number of the attempt that failed
        attempt: u32,
        /// Attempt budget
        max_attempts: u32,
        /// Backoff before the next attempt
        delay: Duration,
        /// Error of the failed attempt
        error: String,
    },
    /// A request failed for good
    RequestFailed {
        /// Request URL
        url: String,
        /// Attempts made
        attempts: u32,
        /// Final error
        error: String,
    },
    /// A result page was fetched and projected
    PageFetched {
        /// Category name
        category: String,
        /// One-based page number
        page: u32,
        /// Bids on this page
        bids: usize,
        /// Total matches reported by the portal
        total_matches: u64,
    },
    /// Pagination was cut short by the page limit
    PageLimitReached {
        /// Category name
        category: String,
        /// Pages fetched before stopping
        pages: u32,
    },
    /// A category finished with at least one bid
    CategoryCompleted {
        /// Category name
        category: String,
        /// Bids collected
        bids: usize,
        /// Pages fetched
        pages: u32,
    },
    /// A category finished without bids
    CategoryEmpty {
        /// Category name
        category: String,
    },
    /// A category was abandoned after a failed page request
    CategoryFailed {
        /// Category name
        category: String,
        /// Page whose request failed
        page: u32,
        /// Failure description
        reason: String,
    },
    /// Every category of a batch has finished
    BatchFinished {
        /// One-based batch number
        batch: usize,
        /// Total number of batches
        total_batches: usize,
    },
    /// The report has been assembled
    RunFinished {
        /// Catalog size
        total_categories: usize,
        /// Categories with at least one bid
        categories_with_bids: usize,
        /// Bids across all categories
        total_bids: usize,
        /// Categories that failed
        failed_categories: usize,
    },
}

impl FetchEvent {
    /// Whether this event marks the end of one category's fetch
    pub fn is_category_terminal(&self) -> bool {
        matches!(
            self,
            FetchEvent::CategoryCompleted { .. }
                | FetchEvent::CategoryEmpty { .. }
                | FetchEvent::CategoryFailed { .. }
        )
    }
}

/// Receiver of fetch events
pub trait EventSink: Send + Sync {
    /// Deliver one event
    fn emit(&self, event: FetchEvent);
}

/// Shared handle to an event sink
pub type SharedEventSink = Arc<dyn EventSink>;

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: FetchEvent) {}
}

/// Shared no-op sink
pub fn noop_sink() -> SharedEventSink {
    Arc::new(NoopSink)
}

/// Sink that logs each event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: FetchEvent) {
        log_event(&event);
    }
}

/// Sink that forwards events to an unbounded channel
///
/// The receiving half is drained by a separate task, so emitting never waits.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<FetchEvent>,
}

impl EventSink for ChannelSink {
    fn emit(&self, event: FetchEvent) {
        // Receiver gone means nobody is listening any more
        let _ = self.sender.send(event);
    }
}

/// Create a channel-backed sink and its receiver
///
/// The receiver yields `None` once every clone of the sink has been dropped.
pub fn channel() -> (ChannelSink, mpsc::UnboundedReceiver<FetchEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelSink { sender }, receiver)
}

/// Log an event with structured fields
pub fn log_event(event: &FetchEvent) {
    match event {
        FetchEvent::RunStarted {
            categories,
            batches,
        } => {
            info!(categories, batches, "Fetching bids");
        }
        FetchEvent::BatchStarted {
            batch,
            total_batches,
            categories,
        } => {
            info!(
                batch,
                total_batches,
                categories = %categories.join(", "),
                "Starting batch"
            );
        }
        FetchEvent::RetryScheduled {
            url,
            attempt,
            max_attempts,
            delay,
            error,
        } => {
            warn!(
                url = %url,
                attempt,
                max_attempts,
                backoff_ms = delay.as_millis() as u64,
                error = %error,
                "Attempt {}/{} failed, retrying in {:?}",
                attempt,
                max_attempts,
                delay
            );
        }
        FetchEvent::RequestFailed {
            url,
            attempts,
            error,
        } => {
            warn!(url = %url, attempts, error = %error, "Request failed after retries");
        }
        FetchEvent::PageFetched {
            category,
            page,
            bids,
            total_matches,
        } => {
            debug!(category = %category, page, bids, total_matches, "Page fetched");
        }
        FetchEvent::PageLimitReached { category, pages } => {
            warn!(category = %category, pages, "Page limit reached, keeping collected bids");
        }
        FetchEvent::CategoryCompleted {
            category,
            bids,
            pages,
        } => {
            info!(category = %category, bids, pages, "Category complete");
        }
        FetchEvent::CategoryEmpty { category } => {
            debug!(category = %category, "Category has no bids");
        }
        FetchEvent::CategoryFailed {
            category,
            page,
            reason,
        } => {
            warn!(category = %category, page, reason = %reason, "Category fetch failed");
        }
        FetchEvent::BatchFinished {
            batch,
            total_batches,
        } => {
            debug!(batch, total_batches, "Batch finished");
        }
        FetchEvent::RunFinished {
            total_categories,
            categories_with_bids,
            total_bids,
            failed_categories,
        } => {
            info!(
                total_categories,
                categories_with_bids,
                total_bids,
                failed_categories,
                "Fetch complete"
            );
        }
    }
}
