//! Google Cloud status adapter.
//!
//! Google publishes an incident history rather than a component list. Only
//! open incidents produce components: one per affected product, with a
//! status derived from the latest update's severity.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use statuswatch_sdk::{FetchError, Source};
use statuswatch_types::{Component, NormalizedStatus, ProviderResult};
use tokio::time::Instant;
use tracing::debug;

use crate::config::{SourceSettings, TargetConfig};
use crate::http::{validate_url, HttpClient};
use crate::ConfigurationError;

/// Provider type name.
pub const PROVIDER: &str = "gcp";

/// The public incident history.
pub const DEFAULT_URL: &str = "https://status.cloud.google.com/incidents.json";

/// Source for the Google Cloud incident feed.
#[derive(Debug, Clone)]
pub struct GcpSource {
    settings: SourceSettings,
    http: HttpClient,
    url: String,
}

impl GcpSource {
    /// Create a source reading `url`, or the public feed when empty.
    pub fn new(settings: SourceSettings, http: HttpClient, url: &str) -> Self {
        let url = url.trim();
        Self {
            settings,
            http,
            url: if url.is_empty() { DEFAULT_URL } else { url }.to_string(),
        }
    }

    pub(crate) fn from_config(
        target: &TargetConfig,
        settings: SourceSettings,
        http: HttpClient,
    ) -> Result<Self, ConfigurationError> {
        let source = Self::new(settings, http, &target.url);
        validate_url(&target.name, &source.url)?;
        Ok(source)
    }
}

#[async_trait]
impl Source for GcpSource {
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
        debug!(page = %self.settings.page, url = %self.url, "gcp fetch");

        let incidents: Vec<Value> = self.http.get_json(&self.url, deadline).await?;
        let result = incidents_to_result(&self.settings.page, &incidents);

        debug!(
            page = %self.settings.page,
            components = result.components.len(),
            open_incidents = ?result.open_incidents,
            "gcp parsed"
        );
        Ok(result)
    }
}

fn incidents_to_result(page: &str, incidents: &[Value]) -> ProviderResult {
    let mut result = ProviderResult::new(PROVIDER, page);
    let mut open = 0u32;

    for incident in incidents.iter().filter(|i| is_open(i)) {
        open += 1;

        let severity = incident
            .get("most_recent_update")
            .and_then(|u| u.get("severity"))
            .and_then(Value::as_str);
        let status = map_severity(severity);

        result.components.extend(
            affected_products(incident)
                .into_iter()
                .map(|product| Component::new(product, status)),
        );
    }

    result.open_incidents = Some(open);
    result
}

/// An incident is open until it has an end time or a final status.
fn is_open(incident: &Value) -> bool {
    let ended = incident
        .get("end")
        .and_then(Value::as_str)
        .is_some_and(|end| !end.trim().is_empty());

    let finished = incident
        .get("status")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
        .is_some_and(|s| s == "resolved" || s == "completed");

    !ended && !finished
}

/// Product names, from plain strings or objects with `id`, `title` or `name`.
fn affected_products(incident: &Value) -> Vec<String> {
    let Some(products) = incident.get("affected_products").and_then(Value::as_array) else {
        return Vec::new();
    };

    products
        .iter()
        .filter_map(|product| match product {
            Value::String(name) => Some(name.clone()),
            Value::Object(fields) => ["id", "title", "name"]
                .iter()
                .filter_map(|key| fields.get(*key).and_then(Value::as_str))
                .find(|v| !v.is_empty())
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

/// Map an incident severity. Unspecified severities count as degraded.
pub fn map_severity(severity: Option<&str>) -> NormalizedStatus {
    match severity.map(str::to_lowercase).as_deref() {
        Some("medium") => NormalizedStatus::PartialOutage,
        Some("high") | Some("critical") => NormalizedStatus::MajorOutage,
        _ => NormalizedStatus::Degraded,
    }
}
