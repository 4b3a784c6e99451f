//! Portal access
//!
//! Layers, bottom up:
//! - [`Transport`] performs exactly one HTTP exchange ([`http::ReqwestTransport`]
//!   in production, scripted implementations in tests)
//! - [`http::RetryingClient`] adds per-attempt timeouts and exponential backoff
//! - [`parser::BidParser`] decodes search responses into bids
//! - [`pagination::CategoryFetcher`] walks every page of one category
//! - [`document::DocumentFetcher`] downloads a single bid document

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub mod document;
pub mod http;
pub mod pagination;
pub mod parser;
pub mod portal_config;
pub mod shared_resources;

/// Fetcher errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetcherError {
    /// A single attempt exceeded its timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure (DNS, refused, reset, body read)
    #[error("network error: {0}")]
    NetworkError(String),

    /// The portal answered with a non-success status
    #[error("remote rejected request with status {status}")]
    RemoteRejection {
        /// HTTP status code
        status: u16,
    },

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    ParseError(String),

    /// Request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetcherError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetcherError::Timeout(_) | FetcherError::NetworkError(_)
        )
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// No body
    Empty,
    /// `application/x-www-form-urlencoded` fields, in order
    Form(Vec<(String, String)>),
}

/// Transport-independent description of one outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Extra headers, in order
    pub headers: Vec<(String, String)>,
    /// Body
    pub body: RequestBody,
}

impl PortalRequest {
    /// A `GET` without headers
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// A form-encoded `POST`
    pub fn post_form(url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Form(fields),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header with this name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// First form field with this name
    pub fn form_field(&self, name: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(fields) => fields
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            RequestBody::Empty => None,
        }
    }
}

/// A fully read response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalResponse {
    /// HTTP status
    pub status: StatusCode,
    /// `Content-Type` header, if any
    pub content_type: Option<String>,
    /// Body bytes
    pub body: Bytes,
}

impl PortalResponse {
    /// Create a response without a content type
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> FetcherResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| FetcherError::ParseError(format!("Failed to deserialize response: {e}")))
    }
}

/// Performs one HTTP exchange, with no retry and no timeout of its own
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and read the whole response
    async fn execute(&self, request: &PortalRequest) -> FetcherResult<PortalResponse>;
}
