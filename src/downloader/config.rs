//! Fetch configuration: retry, pagination and batching parameters
//!
//! Defaults reproduce the portal-friendly behaviour the tool has always had:
//! three attempts with 1s/2s backoff and a 20s timeout per attempt, ten
//! results per page with half a second between pages, two categories at a
//! time with one second between batches.

use std::time::Duration;

/// Default number of attempts per request (initial attempt included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff unit; attempt k waits `base × 2^(k-1)` before attempt k+1
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

/// Default per-attempt timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Results per page served by the portal search endpoint
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Pause between two page requests of the same category
pub const DEFAULT_INTER_PAGE_DELAY_MS: u64 = 500;

/// Upper bound on pages per category, guards against a portal that never
/// stops reporting more matches
pub const DEFAULT_MAX_PAGES: u32 = 1_000;

/// Categories fetched concurrently in one batch
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 2;

/// Pause between two batches
pub const DEFAULT_INTER_BATCH_DELAY_MS: u64 = 1_000;

/// Retry policy for a single outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one; 0 behaves like 1
    pub max_attempts: u32,
    /// Backoff unit
    pub base_delay: Duration,
    /// Bound on each individual attempt
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_attempts: u32, base_delay: Duration, timeout: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            timeout,
        }
    }

    /// Effective attempt budget (never below 1)
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the failed attempt `attempt` (one-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        self.base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
    }

    /// Every delay a request that always fails would sleep through
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        (1..self.attempts()).map(|attempt| self.backoff_delay(attempt)).collect()
    }
}

/// Pagination parameters for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Results per page; 0 behaves like 1
    pub page_size: u32,
    /// Pause before requesting the next page
    pub inter_page_delay: Duration,
    /// Stop after this many pages; 0 behaves like 1
    pub max_pages: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            inter_page_delay: Duration::from_millis(DEFAULT_INTER_PAGE_DELAY_MS),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl PaginationConfig {
    /// Effective page size (never below 1)
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.max(1)
    }

    /// Effective page cap (never below 1)
    pub fn effective_max_pages(&self) -> u32 {
        self.max_pages.max(1)
    }

    /// Whether the portal holds more results after `page`
    pub fn has_more_pages(&self, page: u32, total_matches: u64) -> bool {
        u64::from(page) * u64::from(self.effective_page_size()) < total_matches
    }
}

/// Batch scheduling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Categories fetched concurrently; 0 behaves like 1
    pub concurrency_limit: usize,
    /// Pause between batches
    pub inter_batch_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            inter_batch_delay: Duration::from_millis(DEFAULT_INTER_BATCH_DELAY_MS),
        }
    }
}

impl BatchConfig {
    /// Effective batch size (never below 1)
    pub fn effective_limit(&self) -> usize {
        self.concurrency_limit.max(1)
    }

    /// Number of batches needed for `categories` categories
    pub fn batch_count(&self, categories: usize) -> usize {
        categories.div_ceil(self.effective_limit())
    }
}

/// Everything that tunes a fetch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchConfig {
    /// Per-request retry policy
    pub retry: RetryPolicy,
    /// Per-category pagination
    pub pagination: PaginationConfig,
    /// Batch scheduling
    pub batch: BatchConfig,
}
