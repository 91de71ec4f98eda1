//! Static per-target metadata.

use alloc::string::String;

/// Static description of a configured target, fixed for the process lifetime.
///
/// Only used for the informational `page_info` gauge; independent of any
/// fetch outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageMeta {
    /// Provider kind.
    pub provider: String,
    /// The configured page name.
    pub page: String,
    /// Human-friendly URL to show on dashboards.
    pub url: String,
}

impl PageMeta {
    /// Create page metadata.
    pub fn new(provider: impl Into<String>, page: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            page: page.into(),
            url: url.into(),
        }
    }
}
