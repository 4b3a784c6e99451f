//! Portal endpoints and request shapes
//!
//! The bidplus search endpoint is an XHR endpoint: it wants a form-encoded
//! `payload` field holding a JSON search description, the CSRF token both as a
//! form field and as a cookie, and the `X-Requested-With` marker.

use chrono::NaiveDate;
use serde::Serialize;

use super::{FetcherError, FetcherResult, PortalRequest};

/// Production portal
pub const DEFAULT_BASE_URL: &str = "https://bidplus.gem.gov.in";

/// Search endpoint path
pub const SEARCH_ENDPOINT: &str = "/search-bids";

/// Document endpoint path (document id is appended)
pub const DOCUMENT_ENDPOINT: &str = "/showbidDocument";

/// `Accept` header sent with search requests
pub const SEARCH_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

/// Cookie carrying the CSRF token
pub const CSRF_COOKIE_NAME: &str = "csrf_gem_cookie";

/// Form field carrying the CSRF token
pub const CSRF_FORM_FIELD: &str = "csrf_bd_gem_nk";

/// Load-balancer affinity cookie the portal expects next to the CSRF cookie
pub const SESSION_AFFINITY_COOKIE: &str = "GeM=1474969956.20480.0000";

/// Date format of the `bidEndTo` filter
pub const END_DATE_FORMAT: &str = "%Y-%m-%d";

/// JSON search description sent in the `payload` form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload<'a> {
    /// Always "bidNumber"
    pub search_type: &'static str,
    /// Always empty: we search by category
    pub bid_number: &'static str,
    /// Category identifier
    pub category: &'a str,
    /// Always empty
    pub bid_end_from: &'static str,
    /// Upper bound on bid end date, empty for none
    pub bid_end_to: String,
    /// One-based page number
    pub page: u32,
}

impl<'a> SearchPayload<'a> {
    /// Payload for one page of a category
    pub fn new(category: &'a str, end_date: Option<NaiveDate>, page: u32) -> Self {
        Self {
            search_type: "bidNumber",
            bid_number: "",
            category,
            bid_end_from: "",
            bid_end_to: end_date
                .map(|date| date.format(END_DATE_FORMAT).to_string())
                .unwrap_or_default(),
            page,
        }
    }
}

/// Where and how to reach the portal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Scheme and host, no trailing slash
    pub base_url: String,
    /// Affinity cookie appended to the session cookie
    pub session_affinity_cookie: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl PortalConfig {
    /// Configuration for a portal at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_affinity_cookie: SESSION_AFFINITY_COOKIE.to_string(),
        }
    }

    /// Search endpoint URL
    pub fn search_url(&self) -> String {
        format!("{}{}", self.base_url, SEARCH_ENDPOINT)
    }

    /// Document URL for a document id
    pub fn document_url(&self, document_id: &str) -> String {
        format!("{}{}/{}", self.base_url, DOCUMENT_ENDPOINT, document_id)
    }

    /// Cookie header value for a CSRF token
    pub fn session_cookie(&self, csrf_token: &str) -> String {
        format!(
            "{}={}; {}",
            CSRF_COOKIE_NAME, csrf_token, self.session_affinity_cookie
        )
    }

    /// Search request for one page of a category
    pub fn search_request(
        &self,
        category_id: &str,
        end_date: Option<NaiveDate>,
        page: u32,
        csrf_token: &str,
    ) -> FetcherResult<PortalRequest> {
        let payload = serde_json::to_string(&SearchPayload::new(category_id, end_date, page))
            .map_err(|e| FetcherError::InvalidRequest(format!("Failed to encode payload: {e}")))?;

        let fields = vec![
            ("payload".to_string(), payload),
            (CSRF_FORM_FIELD.to_string(), csrf_token.to_string()),
        ];

        Ok(PortalRequest::post_form(self.search_url(), fields)
            .with_header("accept", SEARCH_ACCEPT)
            .with_header("x-requested-with", "XMLHttpRequest")
            .with_header("cookie", self.session_cookie(csrf_token)))
    }

    /// Download request for a document
    pub fn document_request(&self, document_id: &str) -> PortalRequest {
        PortalRequest::get(self.document_url(document_id))
    }
}
