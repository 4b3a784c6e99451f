//! Batch executor
//!
//! Categories are split into consecutive groups of `concurrency_limit`. All
//! fetchers of a group run concurrently and the executor waits for every one
//! of them before resting and starting the next group. Outcomes come back in
//! catalog order whatever order the fetches finish in.

use chrono::NaiveDate;
use futures::future::join_all;

use crate::downloader::config::BatchConfig;
use crate::events::{noop_sink, FetchEvent, SharedEventSink};
use crate::fetcher::pagination::CategoryFetcher;
use crate::{Category, CategoryOutcome};

/// Runs category fetches group by group
#[derive(Clone)]
pub struct BatchExecutor {
    fetcher: CategoryFetcher,
    config: BatchConfig,
    events: SharedEventSink,
}

impl BatchExecutor {
    /// Create an executor
    pub fn new(fetcher: CategoryFetcher, config: BatchConfig) -> Self {
        Self {
            fetcher,
            config,
            events: noop_sink(),
        }
    }

    /// Emit batch events into `events`
    pub fn with_events(mut self, events: SharedEventSink) -> Self {
        self.events = events;
        self
    }

    /// Batch parameters in force
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Fetch every category, one outcome per category in input order
    pub async fn run(
        &self,
        categories: &[Category],
        end_date: Option<NaiveDate>,
        csrf_token: &str,
    ) -> Vec<CategoryOutcome> {
        let total_batches = self.config.batch_count(categories.len());
        let mut outcomes = Vec::with_capacity(categories.len());

        for (index, group) in categories.chunks(self.config.effective_limit()).enumerate() {
            let batch = index + 1;
            self.events.emit(FetchEvent::BatchStarted {
                batch,
                total_batches,
                categories: group.iter().map(|c| c.name.clone()).collect(),
            });

            let fetches = group
                .iter()
                .map(|category| self.fetcher.fetch_category(category, end_date, csrf_token));
            outcomes.extend(join_all(fetches).await);

            self.events.emit(FetchEvent::BatchFinished {
                batch,
                total_batches,
            });

            if batch < total_batches {
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }
        }

        outcomes
    }
}
