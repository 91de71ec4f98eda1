//! Atlassian Statuspage adapter.
//!
//! Reads `/api/v2/summary.json`, which every Statuspage-hosted page serves
//! without authentication.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use statuswatch_adapters::{HttpClient, SourceSettings};
//! use statuswatch_adapters::statuspage::StatuspageSource;
//! use statuswatch_sdk::Source;
//! use tokio::time::Instant;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = StatuspageSource::new(
//!         SourceSettings::new("github", Duration::from_secs(30), Duration::from_secs(10)),
//!         HttpClient::new("statuswatch/0.1")?,
//!         "www.githubstatus.com",
//!     );
//!
//!     let result = source.fetch(Instant::now() + Duration::from_secs(10)).await?;
//!     for component in &result.components {
//!         println!("{}: {}", component.name, component.status);
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use statuswatch_sdk::{FetchError, Source};
use statuswatch_types::{Component, NormalizedStatus, ProviderResult};
use tokio::time::Instant;
use tracing::debug;

use crate::config::{SourceSettings, TargetConfig};
use crate::http::{nullable, normalize_base_url, validate_url, HttpClient};
use crate::ConfigurationError;

/// Provider type name.
pub const PROVIDER: &str = "statuspage";

/// Source for a Statuspage-hosted status page.
#[derive(Debug, Clone)]
pub struct StatuspageSource {
    settings: SourceSettings,
    http: HttpClient,
    base_url: String,
}

impl StatuspageSource {
    /// Create a source for the page at `base_url`.
    pub fn new(settings: SourceSettings, http: HttpClient, base_url: &str) -> Self {
        Self {
            settings,
            http,
            base_url: normalize_base_url(base_url),
        }
    }

    pub(crate) fn from_config(
        target: &TargetConfig,
        settings: SourceSettings,
        http: HttpClient,
    ) -> Result<Self, ConfigurationError> {
        let url = target.require(PROVIDER, "url", Some(&target.url))?;
        let source = Self::new(settings, http, url);
        validate_url(&target.name, &source.summary_url())?;
        Ok(source)
    }

    /// The summary endpoint this source reads.
    pub fn summary_url(&self) -> String {
        format!("{}/api/v2/summary.json", self.base_url)
    }
}

#[async_trait]
impl Source for StatuspageSource {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn page(&self) -> &str {
        &self.settings.page
    }

    fn interval(&self) -> Duration {
        self.settings.interval
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    async fn fetch(&self, deadline: Instant) -> Result<ProviderResult, FetchError> {
        debug!(page = %self.settings.page, url = %self.summary_url(), "statuspage fetch");

        let summary: Summary = self.http.get_json(&self.summary_url(), deadline).await?;
        let result = summary_to_result(PROVIDER, &self.settings.page, summary);

        debug!(
            page = %self.settings.page,
            components = result.components.len(),
            open_incidents = ?result.open_incidents,
            "statuspage parsed"
        );
        Ok(result)
    }
}

/// The subset of `summary.json` we read.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Summary {
    #[serde(default, deserialize_with = "nullable")]
    pub components: Vec<SummaryComponent>,
    #[serde(default, deserialize_with = "nullable")]
    pub incidents: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub unresolved_incidents: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SummaryComponent {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub group: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub group_id: String,
}

/// Convert a summary into a normalized result.
///
/// Group components are not reported themselves; they name the group of
/// their children.
pub(crate) fn summary_to_result(provider: &str, page: &str, summary: Summary) -> ProviderResult {
    let groups: HashMap<&str, &str> = summary
        .components
        .iter()
        .filter(|c| c.group)
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut result = ProviderResult::new(provider, page);
    result.components = summary
        .components
        .iter()
        .filter(|c| !c.group)
        .map(|c| {
            let group = groups.get(c.group_id.as_str()).copied().unwrap_or_default();
            Component::new(c.name.as_str(), map_status(&c.status)).with_group(group)
        })
        .collect();

    let open_incidents = if !summary.unresolved_incidents.is_empty() {
        summary.unresolved_incidents.len()
    } else if !summary.incidents.is_empty() {
        summary.incidents.len()
    } else {
        result.impacted_components()
    };

    result.open_incidents = Some(u32::try_from(open_incidents).unwrap_or(u32::MAX));
    result
}

/// Map a Statuspage component status.
pub fn map_status(status: &str) -> NormalizedStatus {
    match status {
        "operational" => NormalizedStatus::Operational,
        "under_maintenance" => NormalizedStatus::UnderMaintenance,
        "degraded_performance" => NormalizedStatus::Degraded,
        "partial_outage" => NormalizedStatus::PartialOutage,
        "major_outage" => NormalizedStatus::MajorOutage,
        _ => NormalizedStatus::Unknown,
    }
}
