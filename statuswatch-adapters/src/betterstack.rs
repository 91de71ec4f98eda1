//! Better Stack adapter.
//!
//! Better Stack status pages have no public summary, so this reads the
//! status page resources through the Uptime API with a read token.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use statuswatch_sdk::{FetchError, Source};
use statuswatch_types::{Component, NormalizedStatus, ProviderResult};
use tokio::time::Instant;

use crate::config::{SourceSettings, TargetConfig};
use crate::http::{body, decode_json, expect_ok, normalize_base_url, nullable, send, validate_url, HttpClient};
use crate::ConfigurationError;

/// Provider type name.
pub const PROVIDER: &str = "betterstack";

/// The Uptime API base.
pub const DEFAULT_API_BASE: &str = "https://uptime.betterstack.com";

/// Source for a Better Stack status page.
#[derive(Clone)]
pub struct BetterStackSource {
    settings: SourceSettings,
    http: HttpClient,
    resources_url: String,
    api_token: String,
}

impl std::fmt::Debug for BetterStackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BetterStackSource")
            .field("settings", &self.settings)
            .field("resources_url", &self.resources_url)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

impl BetterStackSource {
    /// Create a source for status page `page_id`.
    ///
    /// `api_base` overrides the Uptime API location when non-empty.
    pub fn new(
        settings: SourceSettings,
        http: HttpClient,
        api_base: &str,
        page_id: &str,
        api_token: &str,
    ) -> Self {
        let base = if api_base.trim().is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            normalize_base_url(api_base)
        };

        Self {
            settings,
            http,
            resources_url: build_resources_url(&base, page_id.trim()),
            api_token: api_token.trim().to_string(),
        }
    }

    pub(crate) fn from_config(
        target: &TargetConfig,
        settings: SourceSettings,
        http: HttpClient,
    ) -> Result<Self, ConfigurationError> {
        let page_id = target.require(PROVIDER, "page_id", target.page_id.as_deref())?;
        let api_token = target.require(PROVIDER, "api_token", target.api_token.as_deref())?;

        let source = Self::new(settings, http, &target.url, page_id, api_token);
        validate_url(&target.name, &source.resources_url)?;
        Ok(source)
    }

    /// The resources endpoint this source reads.
    pub fn resources_url(&self) -> &str {
        &self.resources_url
    }
}

/// Join the resources path onto `base`, escaping `page_id` as one segment.
fn build_resources_url(base: &str, page_id: &str) -> String {
    let fallback = || format!("{}/api/v2/status-pages/{}/resources", base, page_id);

    let Ok(mut url) = reqwest::Url::parse(base) else {
        return fallback();
    };
    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments
                .pop_if_empty()
                .extend(["api", "v2", "status-pages", page_id, "resources"]);
        }
        Err(()) => return fallback(),
    }
    url.into()
}

#[async_trait]
impl Source for BetterStackSource {
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
        let request = self
            .http
            .get(&self.resources_url, deadline)
            .bearer_auth(&self.api_token);
        let response = expect_ok(send(request).await?)?;
        let resources: Resources = decode_json(&body(response).await?)?;

        let mut result = ProviderResult::new(PROVIDER, &self.settings.page);
        result.components = resources
            .data
            .into_iter()
            .map(|r| Component::new(r.attributes.name, map_status(&r.attributes.status)))
            .collect();
        Ok(result)
    }
}

#[derive(Debug, Default, Deserialize)]
struct Resources {
    #[serde(default, deserialize_with = "nullable")]
    data: Vec<Resource>,
}

#[derive(Debug, Default, Deserialize)]
struct Resource {
    #[serde(default, deserialize_with = "nullable")]
    attributes: Attributes,
}

#[derive(Debug, Default, Deserialize)]
struct Attributes {
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    status: String,
}

/// Map a Better Stack resource status, ignoring case.
pub fn map_status(status: &str) -> NormalizedStatus {
    match status.to_lowercase().as_str() {
        "operational" => NormalizedStatus::Operational,
        "maintenance" => NormalizedStatus::UnderMaintenance,
        "degraded_performance" | "degraded" => NormalizedStatus::Degraded,
        "partial_outage" => NormalizedStatus::PartialOutage,
        "major_outage" | "outage" | "down" => NormalizedStatus::MajorOutage,
        _ => NormalizedStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    use super::*;

    fn settings() -> SourceSettings {
        SourceSettings::new("uptime", Duration::from_secs(30), Duration::from_secs(5))
    }

    #[test]
    fn test_map_status() {
        assert_eq!(map_status("operational"), NormalizedStatus::Operational);
        assert_eq!(map_status("Maintenance"), NormalizedStatus::UnderMaintenance);
        assert_eq!(map_status("degraded"), NormalizedStatus::Degraded);
        assert_eq!(map_status("partial_outage"), NormalizedStatus::PartialOutage);
        assert_eq!(map_status("DOWN"), NormalizedStatus::MajorOutage);
        assert_eq!(map_status("paused"), NormalizedStatus::Unknown);
    }

    #[test]
    fn test_default_api_base() {
        let source = BetterStackSource::new(settings(), HttpClient::new("t").unwrap(), "", "42", "tok");
        assert_eq!(
            source.resources_url(),
            "https://uptime.betterstack.com/api/v2/status-pages/42/resources"
        );
    }

    #[test]
    fn test_page_id_is_one_path_segment() {
        let source = BetterStackSource::new(settings(), HttpClient::new("t").unwrap(), "", "a/b?c#d", "tok");
        assert_eq!(
            source.resources_url(),
            "https://uptime.betterstack.com/api/v2/status-pages/a%2Fb%3Fc%23d/resources"
        );
    }

    #[test]
    fn test_api_base_path_is_kept() {
        let source = BetterStackSource::new(
            settings(),
            HttpClient::new("t").unwrap(),
            "http://proxy.local/uptime/",
            "42",
            "tok",
        );
        assert_eq!(
            source.resources_url(),
            "http://proxy.local/uptime/api/v2/status-pages/42/resources"
        );
    }

    #[test]
    fn test_credentials_are_required() {
        let mut target = TargetConfig::new("uptime", PROVIDER, "");
        target.page_id = Some("42".to_string());

        let err = BetterStackSource::from_config(&target, settings(), HttpClient::new("t").unwrap())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingField { field: "api_token", .. }));

        target.page_id = None;
        target.api_token = Some("tok".to_string());
        let err = BetterStackSource::from_config(&target, settings(), HttpClient::new("t").unwrap())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingField { field: "page_id", .. }));
    }

    #[test]
    fn test_debug_hides_token() {
        let source = BetterStackSource::new(settings(), HttpClient::new("t").unwrap(), "", "42", "s3cret");
        assert!(!format!("{:?}", source).contains("s3cret"));
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v2/status-pages/42/resources")
                    .header("authorization", "Bearer tok");
                then.status(200).json_body(json!({
                    "data": [
                        {"id": "1", "type": "status_page_resource", "attributes": {"name": "Website", "status": "operational"}},
                        {"id": "2", "type": "status_page_resource", "attributes": {"name": "API", "status": "downtime"}},
                    ]
                }));
            })
            .await;

        let source = BetterStackSource::new(
            settings(),
            HttpClient::new("statuswatch-test").unwrap(),
            &server.base_url(),
            "42",
            "tok",
        );
        let result = source.fetch(Instant::now() + Duration::from_secs(5)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.provider, "betterstack");
        assert_eq!(result.components[0].status, NormalizedStatus::Operational);
        assert_eq!(result.components[1].status, NormalizedStatus::Unknown);
        assert_eq!(result.open_incidents, None);
    }

    #[tokio::test]
    async fn test_unauthorized_is_a_status_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v2/status-pages/42/resources");
                then.status(401);
            })
            .await;

        let source = BetterStackSource::new(
            settings(),
            HttpClient::new("statuswatch-test").unwrap(),
            &server.base_url(),
            "42",
            "bad",
        );
        let err = source.fetch(Instant::now() + Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err, FetchError::Status(401));
    }
}
