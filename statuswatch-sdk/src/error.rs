//! Error types for fetch attempts.

use thiserror::Error;

/// Errors that can occur when fetching a page.
///
/// A fetch error never escapes the refresh cycle: it is recorded in the
/// source's cache slot and rendered as a failed scrape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Upstream answered with a non-success status code.
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The fetch did not finish before its deadline.
    #[error("Request timed out")]
    Timeout,

    /// The target URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether the attempt was abandoned because of its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout)
    }
}

impl From<tokio::time::error::Elapsed> for FetchError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        FetchError::Timeout
    }
}
