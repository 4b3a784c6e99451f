//! Scripted transport and portal response builders shared by the test suites

#![allow(dead_code)]

use async_trait::async_trait;
use bidplus_fetcher::fetcher::{FetcherError, FetcherResult, PortalRequest, PortalResponse, Transport};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Results per page the scripted portal serves
pub const PAGE_SIZE: u64 = 10;

/// What the scripted portal does with one request
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with a JSON body
    Json(Value),
    /// 200 with a JSON body, after a delay
    JsonAfter(Duration, Value),
    /// Empty body with this status
    Status(u16),
    /// 200 with a raw body
    Raw(&'static str),
    /// 200 with a binary body and optional content type
    Document {
        /// Content-Type header
        content_type: Option<&'static str>,
        /// Body
        body: &'static [u8],
    },
    /// Connection-level failure
    NetworkError,
    /// Never answers
    Hang,
}

type Handler = Box<dyn Fn(&PortalRequest) -> Reply + Send + Sync>;

/// Transport answering from a handler and recording every request
pub struct ScriptedTransport {
    handler: Handler,
    requests: Mutex<Vec<PortalRequest>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&PortalRequest) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    pub fn requests(&self) -> Vec<PortalRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Pages requested for one category, in request order
    pub fn pages_requested(&self, category_id: &str) -> Vec<u32> {
        self.requests()
            .iter()
            .filter_map(search_target)
            .filter(|(category, _)| category == category_id)
            .map(|(_, page)| page)
            .collect()
    }

    /// Highest number of requests in flight at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter when the request ends or is dropped
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(transport: &'a ScriptedTransport) -> Self {
        let now = transport.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        transport.peak.fetch_max(now, Ordering::SeqCst);
        Self(&transport.in_flight)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &PortalRequest) -> FetcherResult<PortalResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = (self.handler)(request);
        let _guard = InFlight::enter(self);

        match reply {
            Reply::Json(body) => Ok(json_response(&body)),
            Reply::JsonAfter(delay, body) => {
                tokio::time::sleep(delay).await;
                Ok(json_response(&body))
            }
            Reply::Status(code) => Ok(PortalResponse::new(
                StatusCode::from_u16(code).unwrap(),
                "",
            )),
            Reply::Raw(body) => Ok(PortalResponse::new(StatusCode::OK, body)),
            Reply::Document { content_type, body } => {
                let response = PortalResponse::new(StatusCode::OK, body);
                Ok(match content_type {
                    Some(content_type) => response.with_content_type(content_type),
                    None => response,
                })
            }
            Reply::NetworkError => Err(FetcherError::NetworkError(
                "connection refused".to_string(),
            )),
            Reply::Hang => std::future::pending().await,
        }
    }
}

fn json_response(body: &Value) -> PortalResponse {
    PortalResponse::new(StatusCode::OK, body.to_string()).with_content_type("application/json")
}

/// Category id and page of a search request
pub fn search_target(request: &PortalRequest) -> Option<(String, u32)> {
    let payload: Value = serde_json::from_str(request.form_field("payload")?).ok()?;
    let category = payload["category"].as_str()?.to_string();
    let page = payload["page"].as_u64()? as u32;
    Some((category, page))
}

/// A portal search document
pub fn bid_doc(id: &str) -> Value {
    json!({
        "id": id,
        "b_bid_number": [format!("GEM/2025/B/{id}")],
        "b_total_quantity": [1],
        "final_end_date_sort": ["2025-04-15T18:00:00Z"],
        "ba_official_details_deptName": ["Department of Posts"]
    })
}

/// A search response envelope
pub fn search_page(num_found: u64, docs: Vec<Value>) -> Value {
    json!({
        "response": {
            "response": {
                "numFound": num_found,
                "docs": docs
            }
        }
    })
}

/// Page `page` of a category holding `total` bids with ids `{category}-{n}`
pub fn page_of(category_id: &str, page: u32, total: u64) -> Value {
    let start = u64::from(page.saturating_sub(1)) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(total);
    let docs = (start..end)
        .map(|n| bid_doc(&format!("{category_id}-{n}")))
        .collect();
    search_page(total, docs)
}

/// Handler serving every category from a table of bid totals; unknown
/// categories are empty
pub fn paginated(totals: Vec<(&'static str, u64)>) -> impl Fn(&PortalRequest) -> Reply + Send + Sync {
    move |request| {
        let Some((category, page)) = search_target(request) else {
            return Reply::Status(400);
        };
        let total = totals
            .iter()
            .find(|(id, _)| *id == category)
            .map(|(_, total)| *total)
            .unwrap_or(0);
        Reply::Json(page_of(&category, page, total))
    }
}

/// Ids of the bids of a result, in order
pub fn bid_ids(bids: &[bidplus_fetcher::Bid]) -> Vec<String> {
    bids.iter().map(|bid| bid.id.clone()).collect()
}
