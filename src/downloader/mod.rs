//! Fetch orchestration
//!
//! # Overview
//!
//! 1. **Request**: what to fetch, see [`job::FetchRequest`]
//! 2. **Scheduling**: categories run in groups via [`executor::BatchExecutor`]
//! 3. **Aggregation**: outcomes fold into a [`aggregate::Report`]
//! 4. **Collection**: [`BidCollector`] ties the three together
//!
//! # Quick Start
//!
//! ```no_run
//! use bidplus_fetcher::catalog::CategoryCatalog;
//! use bidplus_fetcher::downloader::{BidCollector, FetchRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let collector = BidCollector::with_defaults(CategoryCatalog::builtin()?);
//! let report = collector
//!     .collect(&FetchRequest::new(Some("csrf-token".to_string()), None))
//!     .await?;
//! for failure in report.failed_categories() {
//!     eprintln!("{} failed on page {}: {}", failure.category.name, failure.page, failure.reason);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! A run aborts only on a missing credential, detected before any request is
//! sent. The catalog is validated when it is built, so a collector never holds
//! an invalid one. Everything that goes wrong while fetching a category stays
//! with that category and is reported in [`Report::failed_categories`].

use std::sync::Arc;

use crate::catalog::CategoryCatalog;
use crate::events::{FetchEvent, SharedEventSink, TracingSink};
use crate::fetcher::http::{ReqwestTransport, RetryingClient};
use crate::fetcher::pagination::CategoryFetcher;
use crate::fetcher::portal_config::PortalConfig;
use crate::fetcher::Transport;

pub mod aggregate;
pub mod config;
pub mod executor;
pub mod job;

pub use aggregate::{aggregate, Report, ReportStats};
pub use config::{BatchConfig, FetchConfig, PaginationConfig, RetryPolicy};
pub use executor::BatchExecutor;
pub use job::FetchRequest;

/// Errors that abort a whole run
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// No usable CSRF token was supplied
    #[error("csrf token is required")]
    MissingCredential,
}

/// Top-level entry point: fetches every catalog category into one report
#[derive(Clone)]
pub struct BidCollector {
    catalog: CategoryCatalog,
    executor: BatchExecutor,
    events: SharedEventSink,
}

impl BidCollector {
    /// Assemble a collector from its parts
    ///
    /// `events` receives the events of every layer: retries, pages,
    /// categories, batches and the run itself.
    pub fn new(
        catalog: CategoryCatalog,
        transport: Arc<dyn Transport>,
        portal: PortalConfig,
        config: FetchConfig,
        events: SharedEventSink,
    ) -> Self {
        let client = RetryingClient::new(transport, config.retry).with_events(events.clone());
        let fetcher =
            CategoryFetcher::new(client, portal, config.pagination).with_events(events.clone());
        let executor = BatchExecutor::new(fetcher, config.batch).with_events(events.clone());

        Self {
            catalog,
            executor,
            events,
        }
    }

    /// Production collector: shared HTTP client, default portal and tuning,
    /// events logged through `tracing`
    pub fn with_defaults(catalog: CategoryCatalog) -> Self {
        Self::new(
            catalog,
            Arc::new(ReqwestTransport::shared()),
            PortalConfig::default(),
            FetchConfig::default(),
            Arc::new(TracingSink),
        )
    }

    /// The catalog this collector walks
    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    /// Fetch every category and build the report
    ///
    /// # Errors
    /// [`DownloadError::MissingCredential`] when the request carries no
    /// usable token; no request is sent in that case.
    pub async fn collect(&self, request: &FetchRequest) -> Result<Report, DownloadError> {
        let csrf_token = request.credential()?;
        let categories = self.catalog.categories();

        self.events.emit(FetchEvent::RunStarted {
            categories: categories.len(),
            batches: self.executor.config().batch_count(categories.len()),
        });

        let outcomes = self
            .executor
            .run(categories, request.end_date, csrf_token)
            .await;
        let report = aggregate(outcomes, categories.len());

        self.events.emit(FetchEvent::RunFinished {
            total_categories: report.stats().total_categories,
            categories_with_bids: report.stats().categories_with_bids,
            total_bids: report.stats().total_bids,
            failed_categories: report.failed_categories().len(),
        });

        Ok(report)
    }
}
