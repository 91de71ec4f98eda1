//! Azure DevOps health API adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use statuswatch_sdk::{FetchError, Source};
use statuswatch_types::{Component, NormalizedStatus, ProviderResult};
use tokio::time::Instant;
use tracing::debug;

use crate::config::{SourceSettings, TargetConfig};
use crate::http::{nullable, validate_url, HttpClient};
use crate::ConfigurationError;

/// Provider type name.
pub const PROVIDER: &str = "azuredevops";

/// The public health endpoint.
pub const DEFAULT_API_URL: &str =
    "https://status.dev.azure.com/_apis/status/health?api-version=7.1-preview.1";

const STATUS_HOST: &str = "status.dev.azure.com";

/// Source for the Azure DevOps service health API.
#[derive(Debug, Clone)]
pub struct AzureDevOpsSource {
    settings: SourceSettings,
    http: HttpClient,
    api_url: String,
}

impl AzureDevOpsSource {
    /// Create a source reading `url`.
    ///
    /// An empty URL, or the bare status host, means the public endpoint.
    pub fn new(settings: SourceSettings, http: HttpClient, url: &str) -> Self {
        Self {
            settings,
            http,
            api_url: resolve_api_url(url),
        }
    }

    pub(crate) fn from_config(
        target: &TargetConfig,
        settings: SourceSettings,
        http: HttpClient,
    ) -> Result<Self, ConfigurationError> {
        let source = Self::new(settings, http, &target.url);
        validate_url(&target.name, &source.api_url)?;
        Ok(source)
    }

    /// The endpoint this source reads.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

fn resolve_api_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return DEFAULT_API_URL.to_string();
    }

    let bare_host = reqwest::Url::parse(url)
        .map(|u| {
            u.host_str() == Some(STATUS_HOST)
                && (u.path().is_empty() || u.path() == "/")
                && u.query().is_none()
        })
        .unwrap_or(false);

    if bare_host {
        DEFAULT_API_URL.to_string()
    } else {
        url.to_string()
    }
}

#[async_trait]
impl Source for AzureDevOpsSource {
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
        debug!(page = %self.settings.page, url = %self.api_url, "azuredevops fetch");

        let health: Health = self.http.get_json(&self.api_url, deadline).await?;

        let mut result = ProviderResult::new(PROVIDER, &self.settings.page);
        result.components = health
            .services
            .into_iter()
            .map(|s| Component::new(s.name, map_status(&s.status)).with_region(s.geography))
            .collect();

        debug!(
            page = %self.settings.page,
            components = result.components.len(),
            "azuredevops parsed"
        );
        Ok(result)
    }
}

#[derive(Debug, Default, Deserialize)]
struct Health {
    #[serde(default, deserialize_with = "nullable")]
    services: Vec<Service>,
}

#[derive(Debug, Default, Deserialize)]
struct Service {
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    geography: String,
    #[serde(default, deserialize_with = "nullable")]
    status: String,
}

/// Map an Azure DevOps health value.
pub fn map_status(status: &str) -> NormalizedStatus {
    match status {
        "Healthy" => NormalizedStatus::Operational,
        "Degraded" => NormalizedStatus::Degraded,
        "Unhealthy" => NormalizedStatus::MajorOutage,
        "Maintenance" => NormalizedStatus::UnderMaintenance,
        _ => NormalizedStatus::Unknown,
    }
}
