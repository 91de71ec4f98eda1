//! Error types for adapters.

use statuswatch_sdk::FetchError;
use thiserror::Error;

/// Errors detected while turning target configuration into sources.
///
/// These are fatal at startup; nothing is fetched until every target
/// builds cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The target names a provider type that does not exist.
    #[error("page {page:?}: unknown provider type {kind:?}")]
    UnknownProvider { page: String, kind: String },

    /// The provider exists but was compiled out.
    #[error("page {page:?}: provider {kind:?} is not enabled in this build")]
    ProviderDisabled { page: String, kind: String },

    /// A field the provider needs is missing or empty.
    #[error("page {page:?}: {kind} requires {field}")]
    MissingField {
        page: String,
        kind: &'static str,
        field: &'static str,
    },

    /// A configured URL does not parse.
    #[error("page {page:?}: invalid URL {url:?}: {reason}")]
    InvalidUrl {
        page: String,
        url: String,
        reason: String,
    },

    /// The shared HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Map a transport failure to a fetch error.
pub(crate) fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_connect() {
        FetchError::Connection(err.to_string())
    } else if err.is_builder() {
        FetchError::InvalidUrl(err.to_string())
    } else if err.is_decode() {
        FetchError::Parse(err.to_string())
    } else {
        FetchError::Http(err.to_string())
    }
}
