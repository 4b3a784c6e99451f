//! Inbound fetch request

use chrono::NaiveDate;

use crate::downloader::DownloadError;

/// What the caller asked for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    /// Opaque CSRF token; required
    pub csrf_token: Option<String>,
    /// Upper bound on bid end dates
    pub end_date: Option<NaiveDate>,
}

impl FetchRequest {
    /// Create a request
    pub fn new(csrf_token: Option<String>, end_date: Option<NaiveDate>) -> Self {
        Self {
            csrf_token,
            end_date,
        }
    }

    /// The token, if present and not blank
    ///
    /// # Errors
    /// [`DownloadError::MissingCredential`] otherwise.
    pub fn credential(&self) -> Result<&str, DownloadError> {
        self.csrf_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(DownloadError::MissingCredential)
    }
}
