//! Instatus adapter.
//!
//! Prefers `/v2/components.json` and falls back to the legacy
//! `/summary.json` when the page does not serve the v2 endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use statuswatch_sdk::{FetchError, Source};
use statuswatch_types::{Component, NormalizedStatus, ProviderResult};
use tokio::time::Instant;
use tracing::debug;

use crate::config::{SourceSettings, TargetConfig};
use crate::http::{body, decode_json, expect_ok, normalize_base_url, nullable, send, validate_url, HttpClient};
use crate::ConfigurationError;

/// Provider type name.
pub const PROVIDER: &str = "instatus";

/// Source for an Instatus-hosted status page.
#[derive(Debug, Clone)]
pub struct InstatusSource {
    settings: SourceSettings,
    http: HttpClient,
    base_url: String,
}

impl InstatusSource {
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
        validate_url(&target.name, &source.components_url())?;
        Ok(source)
    }

    /// The preferred components endpoint.
    pub fn components_url(&self) -> String {
        format!("{}/v2/components.json", self.base_url)
    }

    /// The legacy summary endpoint.
    pub fn legacy_url(&self) -> String {
        format!("{}/summary.json", self.base_url)
    }

    async fn fetch_legacy(&self, deadline: Instant) -> Result<ProviderResult, FetchError> {
        debug!(page = %self.settings.page, url = %self.legacy_url(), "instatus legacy fetch");

        let document: serde_json::Value = self.http.get_json(&self.legacy_url(), deadline).await?;
        Ok(legacy_to_result(&self.settings.page, &document))
    }
}

#[async_trait]
impl Source for InstatusSource {
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
        let response = send(self.http.get(&self.components_url(), deadline)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return self.fetch_legacy(deadline).await;
        }

        let components: ComponentsV2 = decode_json(&body(expect_ok(response)?).await?)?;

        let mut result = ProviderResult::new(PROVIDER, &self.settings.page);
        result.components = components
            .components
            .into_iter()
            .map(|c| Component::new(c.name, map_status(&c.status)).with_group(c.group_name))
            .collect();

        debug!(
            page = %self.settings.page,
            components = result.components.len(),
            "instatus parsed"
        );
        Ok(result)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ComponentsV2 {
    #[serde(default, deserialize_with = "nullable")]
    components: Vec<InstatusComponent>,
}

#[derive(Debug, Default, Deserialize)]
struct InstatusComponent {
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    status: String,
    #[serde(default, deserialize_with = "nullable")]
    group_name: String,
}

/// Best-effort read of the legacy summary; fields of the wrong type are
/// treated as empty.
fn legacy_to_result(page: &str, document: &serde_json::Value) -> ProviderResult {
    let field = |value: &serde_json::Value, key: &str| -> String {
        value.get(key).and_then(|v| v.as_str()).unwrap_or_default().to_string()
    };

    let mut result = ProviderResult::new(PROVIDER, page);
    if let Some(components) = document.get("components").and_then(|c| c.as_array()) {
        result.components = components
            .iter()
            .map(|c| {
                Component::new(field(c, "name"), map_status(&field(c, "status")))
                    .with_group(field(c, "group_name"))
            })
            .collect();
    }
    result
}

/// Map an Instatus component status, ignoring case.
pub fn map_status(status: &str) -> NormalizedStatus {
    match status.to_uppercase().as_str() {
        "OPERATIONAL" => NormalizedStatus::Operational,
        "UNDERMAINTENANCE" | "MAINTENANCE" => NormalizedStatus::UnderMaintenance,
        "DEGRADEDPERFORMANCE" | "DEGRADED" => NormalizedStatus::Degraded,
        "PARTIALOUTAGE" => NormalizedStatus::PartialOutage,
        "MAJOROUTAGE" | "OUTAGE" => NormalizedStatus::MajorOutage,
        _ => NormalizedStatus::Unknown,
    }
}
