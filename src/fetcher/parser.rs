//! Search response parser
//!
//! The portal answers with a Solr-style envelope:
//! `{"response": {"response": {"numFound": 25, "docs": [...]}}}`.
//! Document fields are usually single-element arrays (`"b_bid_number": ["..."]`)
//! but plain scalars are accepted too. Projection is best-effort: a missing or
//! unreadable optional field becomes `None`, a missing id or bid number
//! becomes [`NOT_AVAILABLE`].

use crate::fetcher::{FetcherError, FetcherResult};
use crate::{Bid, NOT_AVAILABLE};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Bid number field
pub const FIELD_BID_NUMBER: &str = "b_bid_number";
/// Total quantity field
pub const FIELD_QUANTITY: &str = "b_total_quantity";
/// Bid end date field
pub const FIELD_END_DATE: &str = "final_end_date_sort";
/// Department name field
pub const FIELD_DEPARTMENT: &str = "ba_official_details_deptName";

/// One decoded result page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPage {
    /// Raw documents on this page
    pub docs: Vec<Value>,
    /// Total matches across all pages
    pub num_found: u64,
}

/// Stateless parser for portal search responses
pub struct BidParser;

impl BidParser {
    /// Decode a search response body
    ///
    /// A body that is not JSON is an error. A JSON body without the nested
    /// `response.response` object is read as an empty page, which ends
    /// pagination normally.
    pub fn parse_search_page(body: &[u8]) -> FetcherResult<SearchPage> {
        let root: Value = serde_json::from_slice(body)
            .map_err(|e| FetcherError::ParseError(format!("Invalid search response: {e}")))?;

        let inner = match root.get("response").and_then(|r| r.get("response")) {
            Some(inner) => inner,
            None => return Ok(SearchPage::default()),
        };

        let docs = inner
            .get("docs")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let num_found = inner
            .get("numFound")
            .and_then(|n| n.as_u64().or_else(|| n.as_str()?.trim().parse().ok()))
            .unwrap_or(0);

        Ok(SearchPage { docs, num_found })
    }

    /// Project every document of a page, preserving order
    pub fn project_bids(docs: &[Value]) -> Vec<Bid> {
        docs.iter().map(Self::project_bid).collect()
    }

    /// Project one document into a bid
    pub fn project_bid(doc: &Value) -> Bid {
        Bid {
            id: Self::text_field(doc, "id").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            bid_number: Self::text_field(doc, FIELD_BID_NUMBER)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            quantity: Self::first_value(doc, FIELD_QUANTITY).and_then(Self::parse_quantity),
            end_date: Self::text_field(doc, FIELD_END_DATE)
                .and_then(|raw| Self::parse_end_date(&raw)),
            department: Self::text_field(doc, FIELD_DEPARTMENT),
        }
    }

    /// First element of an array field, or the field itself when scalar
    fn first_value<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
        match doc.get(field)? {
            Value::Array(items) => items.first(),
            Value::Null => None,
            value => Some(value),
        }
    }

    /// Field as non-empty text; numbers are rendered
    fn text_field(doc: &Value, field: &str) -> Option<String> {
        let text = match Self::first_value(doc, field)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    fn parse_quantity(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Parse a bid end date: RFC 3339, naive date-time (read as UTC), or date
    pub fn parse_end_date(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(naive.and_utc());
            }
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}
