//! Per-category pagination
//!
//! [`CategoryFetcher::fetch_category`] walks result pages 1, 2, ... of one
//! category. It stops when a page comes back empty, when
//! `page × page_size` reaches the reported match count, or when the page
//! limit is hit. The first page request that fails for good abandons the
//! category and discards whatever earlier pages produced.
//!
//! Includes safety mechanisms:
//! - Maximum page limit to prevent a runaway loop
//! - Empty response detection

use chrono::NaiveDate;

use crate::downloader::config::PaginationConfig;
use crate::events::{noop_sink, FetchEvent, SharedEventSink};
use crate::fetcher::http::RetryingClient;
use crate::fetcher::parser::{BidParser, SearchPage};
use crate::fetcher::portal_config::PortalConfig;
use crate::fetcher::{FetcherError, FetcherResult};
use crate::{Bid, Category, CategoryFailure, CategoryOutcome, CategoryResult};

/// Fetches every page of a category
#[derive(Clone)]
pub struct CategoryFetcher {
    client: RetryingClient,
    portal: PortalConfig,
    pagination: PaginationConfig,
    events: SharedEventSink,
}

impl CategoryFetcher {
    /// Create a fetcher
    pub fn new(client: RetryingClient, portal: PortalConfig, pagination: PaginationConfig) -> Self {
        Self {
            client,
            portal,
            pagination,
            events: noop_sink(),
        }
    }

    /// Emit page and category events into `events`
    pub fn with_events(mut self, events: SharedEventSink) -> Self {
        self.events = events;
        self
    }

    /// Pagination parameters in force
    pub fn pagination(&self) -> &PaginationConfig {
        &self.pagination
    }

    /// Fetch all bids of `category`
    ///
    /// Never returns an error: a failed page turns into
    /// [`CategoryOutcome::Failed`].
    pub async fn fetch_category(
        &self,
        category: &Category,
        end_date: Option<NaiveDate>,
        csrf_token: &str,
    ) -> CategoryOutcome {
        let mut bids: Vec<Bid> = Vec::new();
        let mut page: u32 = 1;
        let mut pages_fetched: u32 = 0;

        loop {
            let search_page = match self
                .fetch_page(&category.identifier, end_date, page, csrf_token)
                .await
            {
                Ok(search_page) => search_page,
                Err(error) => return self.failed(category, page, &error),
            };
            pages_fetched = page;

            if search_page.docs.is_empty() {
                break;
            }

            let page_bids = BidParser::project_bids(&search_page.docs);
            self.events.emit(FetchEvent::PageFetched {
                category: category.name.clone(),
                page,
                bids: page_bids.len(),
                total_matches: search_page.num_found,
            });
            bids.extend(page_bids);

            if !self.pagination.has_more_pages(page, search_page.num_found) {
                break;
            }

            // No pause when the next page will not be requested
            if page >= self.pagination.effective_max_pages() {
                self.events.emit(FetchEvent::PageLimitReached {
                    category: category.name.clone(),
                    pages: pages_fetched,
                });
                break;
            }

            tokio::time::sleep(self.pagination.inter_page_delay).await;
            page += 1;
        }

        if bids.is_empty() {
            self.events.emit(FetchEvent::CategoryEmpty {
                category: category.name.clone(),
            });
            return CategoryOutcome::Empty(category.clone());
        }

        self.events.emit(FetchEvent::CategoryCompleted {
            category: category.name.clone(),
            bids: bids.len(),
            pages: pages_fetched,
        });
        CategoryOutcome::Found(CategoryResult {
            category: category.clone(),
            bids,
        })
    }

    /// Request and decode one page
    async fn fetch_page(
        &self,
        category_id: &str,
        end_date: Option<NaiveDate>,
        page: u32,
        csrf_token: &str,
    ) -> FetcherResult<SearchPage> {
        let request = self
            .portal
            .search_request(category_id, end_date, page, csrf_token)?;
        let response = self.client.send(&request).await?;

        if !response.is_success() {
            return Err(FetcherError::RemoteRejection {
                status: response.status.as_u16(),
            });
        }

        BidParser::parse_search_page(&response.body)
    }

    fn failed(&self, category: &Category, page: u32, error: &FetcherError) -> CategoryOutcome {
        let reason = error.to_string();
        self.events.emit(FetchEvent::CategoryFailed {
            category: category.name.clone(),
            page,
            reason: reason.clone(),
        });
        CategoryOutcome::Failed(CategoryFailure {
            category: category.clone(),
            page,
            reason,
        })
    }
}
