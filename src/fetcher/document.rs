//! Bid document download

use bytes::Bytes;

use crate::fetcher::http::RetryingClient;
use crate::fetcher::portal_config::PortalConfig;
use crate::fetcher::{FetcherError, FetcherResult};

/// Content type assumed when the portal sends none
pub const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

/// A downloaded bid document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Suggested file name, extension included
    pub filename: String,
    /// Content type reported by the portal
    pub content_type: String,
    /// Document bytes
    pub bytes: Bytes,
}

/// Downloads bid documents by portal id
#[derive(Clone)]
pub struct DocumentFetcher {
    client: RetryingClient,
    portal: PortalConfig,
}

impl DocumentFetcher {
    /// Create a fetcher
    pub fn new(client: RetryingClient, portal: PortalConfig) -> Self {
        Self { client, portal }
    }

    /// Download document `id`, naming it after `display_name` when given
    ///
    /// # Errors
    /// `InvalidRequest` for a blank id, `RemoteRejection` for a non-2xx
    /// answer, or the transport error once retries are exhausted.
    pub async fn download(&self, id: &str, display_name: Option<&str>) -> FetcherResult<Document> {
        let id = id.trim();
        if id.is_empty() {
            return Err(FetcherError::InvalidRequest(
                "document id is required".to_string(),
            ));
        }

        let response = self.client.send(&self.portal.document_request(id)).await?;
        if !response.is_success() {
            return Err(FetcherError::RemoteRejection {
                status: response.status.as_u16(),
            });
        }

        let content_type = response
            .content_type
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Ok(Document {
            filename: document_filename(&content_type, display_name, id),
            content_type,
            bytes: response.body,
        })
    }
}

/// File name for a document: `{display_name or id}.{pdf|doc}`
///
/// Path separators in the stem are replaced with `_`, so bid numbers such as
/// `GEM/2025/B/123` stay a single path component.
pub fn document_filename(content_type: &str, display_name: Option<&str>, id: &str) -> String {
    let extension = if content_type.to_ascii_lowercase().contains("pdf") {
        "pdf"
    } else {
        "doc"
    };

    let stem = display_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(id);
    let stem: String = stem
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();

    format!("{stem}.{extension}")
}
