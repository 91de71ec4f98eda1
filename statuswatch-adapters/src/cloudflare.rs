//! Cloudflare status adapter.
//!
//! Cloudflare runs on Statuspage, so the summary payload is handled exactly
//! like [`crate::statuspage`]. A URL with a path is used as the endpoint
//! verbatim, which also allows pointing at `incidents.json`; that payload
//! is interpreted from the incidents themselves.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use statuswatch_sdk::{FetchError, Source};
use statuswatch_types::{Component, NormalizedStatus, ProviderResult};
use tokio::time::Instant;
use tracing::debug;

use crate::config::{SourceSettings, TargetConfig};
use crate::http::{body, expect_ok, normalize_base_url, nullable, send, validate_url, HttpClient};
use crate::statuspage::{summary_to_result, Summary};
use crate::ConfigurationError;

/// Provider type name.
pub const PROVIDER: &str = "cloudflare";

/// Default status page base.
pub const DEFAULT_BASE_URL: &str = "https://www.cloudflarestatus.com";

const SNIPPET_LEN: usize = 200;

/// Source for Cloudflare's status page.
#[derive(Debug, Clone)]
pub struct CloudflareSource {
    settings: SourceSettings,
    http: HttpClient,
    endpoint: String,
}

impl CloudflareSource {
    /// Create a source reading from `url`.
    ///
    /// An empty URL means the public Cloudflare page. A URL without a path
    /// gets `/api/v2/summary.json` appended.
    pub fn new(settings: SourceSettings, http: HttpClient, url: &str) -> Self {
        let raw = if url.trim().is_empty() { DEFAULT_BASE_URL } else { url };
        let base = normalize_base_url(raw);

        let has_path = reqwest::Url::parse(&base)
            .map(|u| !u.path().is_empty() && u.path() != "/")
            .unwrap_or(false);
        let endpoint = if has_path {
            base
        } else {
            format!("{}/api/v2/summary.json", base)
        };

        Self {
            settings,
            http,
            endpoint,
        }
    }

    pub(crate) fn from_config(
        target: &TargetConfig,
        settings: SourceSettings,
        http: HttpClient,
    ) -> Result<Self, ConfigurationError> {
        let source = Self::new(settings, http, &target.url);
        validate_url(&target.name, &source.endpoint)?;
        Ok(source)
    }

    /// The endpoint this source reads.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Source for CloudflareSource {
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
        debug!(page = %self.settings.page, url = %self.endpoint, "cloudflare fetch");

        let request = self
            .http
            .get(&self.endpoint, deadline)
            .header(ACCEPT, "application/json");
        let response = expect_ok(send(request).await?)?;
        let body = body(response).await?;

        let result = parse(&self.settings.page, &body)?;
        debug!(
            page = %self.settings.page,
            components = result.components.len(),
            open_incidents = ?result.open_incidents,
            "cloudflare parsed"
        );
        Ok(result)
    }
}

#[derive(Debug, Default, Deserialize)]
struct Incident {
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    status: String,
    #[serde(default, deserialize_with = "nullable")]
    impact: String,
    #[serde(default, deserialize_with = "nullable")]
    components: Vec<IncidentComponent>,
}

#[derive(Debug, Default, Deserialize)]
struct IncidentComponent {
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    status: String,
}

/// Parse either a summary or an incidents payload.
fn parse(page: &str, body: &[u8]) -> Result<ProviderResult, FetchError> {
    let document: serde_json::Value = serde_json::from_slice(body).map_err(|_| {
        let snippet: String = String::from_utf8_lossy(body).chars().take(SNIPPET_LEN).collect();
        FetchError::Parse(format!("invalid JSON response (maybe HTML). snippet={:?}", snippet))
    })?;

    let summary: Summary =
        serde_json::from_value(document).map_err(|e| FetchError::Parse(e.to_string()))?;

    if !summary.components.is_empty() {
        return Ok(summary_to_result(PROVIDER, page, summary));
    }

    let mut result = ProviderResult::new(PROVIDER, page);
    let mut open = 0u32;

    for raw in summary.incidents {
        let incident: Incident =
            serde_json::from_value(raw).map_err(|e| FetchError::Parse(e.to_string()))?;

        let status = incident.status.trim().to_lowercase();
        if status.contains("resolved") || status.contains("closed") {
            continue;
        }
        open += 1;

        if incident.components.is_empty() {
            let derived = format!("{} {}", incident.status, incident.impact);
            result
                .components
                .push(Component::new(incident.name, map_incident_status(&derived)));
        } else {
            result.components.extend(
                incident
                    .components
                    .into_iter()
                    .map(|c| Component::new(c.name, map_incident_status(&c.status))),
            );
        }
    }

    result.open_incidents = Some(open);
    Ok(result)
}

/// Infer a status from free-form incident wording.
///
/// Keywords are checked from most to least reassuring; the first match wins.
pub fn map_incident_status(text: &str) -> NormalizedStatus {
    let t = text.trim().to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| t.contains(w));

    if t.is_empty() {
        NormalizedStatus::Unknown
    } else if has(&["resolved", "fixed", "completed"]) {
        NormalizedStatus::Operational
    } else if has(&["maintenance", "scheduled"]) {
        NormalizedStatus::UnderMaintenance
    } else if has(&["major", "outage", "down", "critical", "unavailable"]) {
        NormalizedStatus::MajorOutage
    } else if has(&["partial", "degraded", "degradation", "minor"]) {
        NormalizedStatus::PartialOutage
    } else if has(&["impact", "issues", "service"]) {
        NormalizedStatus::Degraded
    } else {
        NormalizedStatus::Unknown
    }
}
