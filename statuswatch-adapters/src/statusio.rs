//! Status.io adapter.
//!
//! Status.io pages expose a per-page public status API; the configured URL
//! is that endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use statuswatch_sdk::{FetchError, Source};
use statuswatch_types::{Component, NormalizedStatus, ProviderResult};
use tokio::time::Instant;

use crate::config::{SourceSettings, TargetConfig};
use crate::http::{nullable, validate_url, HttpClient};
use crate::ConfigurationError;

/// Provider type name.
pub const PROVIDER: &str = "statusio";

/// Source for a Status.io public status API.
#[derive(Debug, Clone)]
pub struct StatusIoSource {
    settings: SourceSettings,
    http: HttpClient,
    api_url: String,
}

impl StatusIoSource {
    /// Create a source reading `api_url`.
    pub fn new(settings: SourceSettings, http: HttpClient, api_url: &str) -> Self {
        Self {
            settings,
            http,
            api_url: api_url.trim().to_string(),
        }
    }

    pub(crate) fn from_config(
        target: &TargetConfig,
        settings: SourceSettings,
        http: HttpClient,
    ) -> Result<Self, ConfigurationError> {
        let url = target.require(PROVIDER, "url", Some(&target.url))?;
        validate_url(&target.name, url)?;
        Ok(Self::new(settings, http, url))
    }
}

#[async_trait]
impl Source for StatusIoSource {
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
        let response: StatusResponse = self.http.get_json(&self.api_url, deadline).await?;

        let mut result = ProviderResult::new(PROVIDER, &self.settings.page);
        result.components = response
            .result
            .status
            .into_iter()
            .map(|s| Component::new(s.name, map_status_code(s.status_code)))
            .collect();
        Ok(result)
    }
}

#[derive(Debug, Default, Deserialize)]
struct StatusResponse {
    #[serde(default, deserialize_with = "nullable")]
    result: StatusResult,
}

#[derive(Debug, Default, Deserialize)]
struct StatusResult {
    #[serde(default, deserialize_with = "nullable")]
    status: Vec<StatusEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusEntry {
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    status_code: i64,
}

/// Map a Status.io numeric status code.
///
/// 100 operational, 200 maintenance, 300 degraded performance, 400 partial
/// disruption, 500 disruption, 600 security event.
pub fn map_status_code(code: i64) -> NormalizedStatus {
    match code {
        100 => NormalizedStatus::Operational,
        200 => NormalizedStatus::UnderMaintenance,
        300 => NormalizedStatus::Degraded,
        400 => NormalizedStatus::PartialOutage,
        500 | 600 => NormalizedStatus::MajorOutage,
        _ => NormalizedStatus::Unknown,
    }
}
