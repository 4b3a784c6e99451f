//! # bidplus-fetcher
//!
//! Retrieves procurement listings ("bids") from the GeM bidplus search portal
//! across a catalog of categories and folds them into a single report.
//!
//! ## Features
//!
//! - **Pagination**: walks every result page of a category until the portal's
//!   reported match count is reached
//! - **Retry with backoff**: each page request gets a per-attempt timeout and
//!   exponential backoff between attempts
//! - **Batching**: categories run a few at a time with a pause between groups so
//!   the outbound connection pool and the portal are never flooded
//! - **Failure isolation**: a category that cannot be fetched is reported as
//!   failed without affecting any other category
//! - **Event stream**: every stage emits [`events::FetchEvent`]s; logging,
//!   metrics and progress display are consumers of that stream
//!
//! ## Quick Start
//!
//! ```no_run
//! use bidplus_fetcher::catalog::CategoryCatalog;
//! use bidplus_fetcher::downloader::{BidCollector, FetchRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let collector = BidCollector::with_defaults(CategoryCatalog::builtin()?);
//! let request = FetchRequest::new(Some("csrf-token".to_string()), None);
//!
//! let report = collector.collect(&request).await?;
//! println!(
//!     "{} bids in {} of {} categories",
//!     report.stats().total_bids,
//!     report.stats().categories_with_bids,
//!     report.stats().total_categories
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`catalog`] - Category catalog (built-in table or JSON file)
//! - [`fetcher`] - Transport seam, retrying client, response parsing, pagination
//! - [`downloader`] - Batch scheduling, aggregation and the top-level collector
//! - [`events`] - Structured event stream and its logging consumer
//! - [`output`] - Report writers (JSON, CSV)
//! - [`metrics`] - Prometheus metrics fed from the event stream
//! - [`cli`] - Command-line interface

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category catalog
pub mod catalog;

/// CLI command implementations
pub mod cli;

/// Fetch orchestration: scheduling, aggregation, collection
pub mod downloader;

/// Structured fetch events
pub mod events;

/// Portal access: transport, retry, parsing, pagination
pub mod fetcher;

/// Metrics collection
pub mod metrics;

/// Report writers
pub mod output;

pub use downloader::{BidCollector, FetchRequest, Report, ReportStats};

/// Placeholder used when a required bid field is missing from the portal document
pub const NOT_AVAILABLE: &str = "N/A";

/// A portal category to query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Human-readable category name
    #[serde(rename = "category_name")]
    pub name: String,
    /// Portal taxonomy identifier (e.g. "home_clou")
    #[serde(rename = "category_id")]
    pub identifier: String,
}

impl Category {
    /// Create a category from its name and identifier
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
        }
    }
}

/// A single procurement listing projected out of a portal search document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// Portal document id, used to download the bid document
    pub id: String,
    /// Bid number (e.g. "GEM/2025/B/1234567")
    pub bid_number: String,
    /// Total quantity, when the portal reports one
    pub quantity: Option<u64>,
    /// Bid closing time, when the portal reports one
    pub end_date: Option<DateTime<Utc>>,
    /// Buying department, when the portal reports one
    pub department: Option<String>,
}

/// Every bid collected for one category, in page order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    /// The category these bids belong to
    #[serde(flatten)]
    pub category: Category,
    /// Bids in page-arrival order
    pub bids: Vec<Bid>,
}

/// Why a category produced no result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFailure {
    /// The category that failed
    #[serde(flatten)]
    pub category: Category,
    /// Page number whose request failed
    pub page: u32,
    /// Error description
    pub reason: String,
}

/// Outcome of fetching one category
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryOutcome {
    /// At least one bid was collected
    Found(CategoryResult),
    /// Pagination ended normally without any bids
    Empty(Category),
    /// A page request failed; pages already fetched were discarded
    Failed(CategoryFailure),
}

impl CategoryOutcome {
    /// The category this outcome belongs to
    pub fn category(&self) -> &Category {
        match self {
            CategoryOutcome::Found(result) => &result.category,
            CategoryOutcome::Empty(category) => category,
            CategoryOutcome::Failed(failure) => &failure.category,
        }
    }

    /// Number of bids carried by this outcome
    pub fn bid_count(&self) -> usize {
        match self {
            CategoryOutcome::Found(result) => result.bids.len(),
            _ => 0,
        }
    }

    /// Whether this outcome is a failure
    pub fn is_failed(&self) -> bool {
        matches!(self, CategoryOutcome::Failed(_))
    }

    /// Consume the outcome, keeping only a non-empty result
    pub fn into_result(self) -> Option<CategoryResult> {
        match self {
            CategoryOutcome::Found(result) => Some(result),
            _ => None,
        }
    }
}
