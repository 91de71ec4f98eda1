//! Target configuration and source construction.
//!
//! Each [`TargetConfig`] names a provider type and the fields that provider
//! needs. [`build_sources`] validates every target and returns the sources in
//! configuration order, or the first [`ConfigurationError`].

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use statuswatch_sdk::{Source, Target};
use tracing::debug;

use crate::http::HttpClient;
use crate::ConfigurationError;

/// Default refresh interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Default per-fetch timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default HTTP user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("statuswatch/", env!("CARGO_PKG_VERSION"));

/// One configured status page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Short name, used as the `page` label.
    pub name: String,
    /// Provider type, e.g. `statuspage` or `gcp`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Base URL or API endpoint, depending on the provider.
    pub url: String,
    /// URL shown on dashboards, defaults to `url`.
    pub user_friendly_url: Option<String>,
    /// Refresh interval override.
    #[serde(deserialize_with = "crate::duration::deserialize_option")]
    pub interval: Option<Duration>,
    /// Fetch timeout override.
    #[serde(deserialize_with = "crate::duration::deserialize_option")]
    pub timeout: Option<Duration>,
    /// API token, for providers that need one.
    pub api_token: Option<String>,
    /// Provider-side page identifier.
    pub page_id: Option<String>,
    /// Feeds to aggregate, for `aws_rss`.
    pub feeds: Vec<FeedConfig>,
}

impl TargetConfig {
    /// Create a target of `kind` named `name` pointing at `url`.
    pub fn new(name: impl Into<String>, kind: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// The URL to show on dashboards.
    pub fn display_url(&self) -> &str {
        self.user_friendly_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.url)
    }

    pub(crate) fn require<'a>(
        &self,
        kind: &'static str,
        field: &'static str,
        value: Option<&'a str>,
    ) -> Result<&'a str, ConfigurationError> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigurationError::MissingField {
                page: self.name.clone(),
                kind,
                field,
            })
    }
}

/// One RSS feed aggregated by an `aws_rss` target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    /// Service name, used as the component name.
    pub service: String,
    /// Region, carried as the `region` label.
    pub region: String,
}

/// Settings applied to targets that do not override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDefaults {
    pub interval: Duration,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for SourceDefaults {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Resolved per-source settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    /// The `page` label.
    pub page: String,
    pub interval: Duration,
    pub timeout: Duration,
}

impl SourceSettings {
    /// Create settings for `page`.
    pub fn new(page: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        Self {
            page: page.into(),
            interval,
            timeout,
        }
    }

    /// Resolve overrides from `target` against `defaults`.
    ///
    /// Missing or zero values fall back to the defaults.
    pub fn resolve(target: &TargetConfig, defaults: &SourceDefaults) -> Self {
        let pick = |value: Option<Duration>, fallback: Duration| {
            value.filter(|d| !d.is_zero()).unwrap_or(fallback)
        };

        Self {
            page: target.name.clone(),
            interval: pick(target.interval, defaults.interval),
            timeout: pick(target.timeout, defaults.timeout),
        }
    }
}

/// Build a source for every target, in order.
pub fn build_sources(
    targets: &[TargetConfig],
    defaults: &SourceDefaults,
) -> Result<Vec<Target>, ConfigurationError> {
    let http = HttpClient::new(&defaults.user_agent)?;

    targets
        .iter()
        .map(|target| {
            let source = build_source(target, defaults, &http)?;
            debug!(
                provider = source.provider(),
                page = source.page(),
                interval_ms = source.interval().as_millis() as u64,
                timeout_ms = source.timeout().as_millis() as u64,
                "configured source"
            );
            Ok(Target::new(source, target.display_url()))
        })
        .collect()
}

fn build_source(
    target: &TargetConfig,
    defaults: &SourceDefaults,
    http: &HttpClient,
) -> Result<Arc<dyn Source>, ConfigurationError> {
    if target.name.trim().is_empty() {
        return Err(ConfigurationError::MissingField {
            page: target.name.clone(),
            kind: "page",
            field: "name",
        });
    }

    let settings = SourceSettings::resolve(target, defaults);
    let http = http.clone();

    let source: Arc<dyn Source> = match target.kind.as_str() {
        crate::statuspage::PROVIDER => Arc::new(crate::statuspage::StatuspageSource::from_config(
            target, settings, http,
        )?),
        crate::cloudflare::PROVIDER => Arc::new(crate::cloudflare::CloudflareSource::from_config(
            target, settings, http,
        )?),
        crate::instatus::PROVIDER => Arc::new(crate::instatus::InstatusSource::from_config(
            target, settings, http,
        )?),
        crate::statusio::PROVIDER => Arc::new(crate::statusio::StatusIoSource::from_config(
            target, settings, http,
        )?),
        crate::azuredevops::PROVIDER => Arc::new(
            crate::azuredevops::AzureDevOpsSource::from_config(target, settings, http)?,
        ),
        crate::gcp::PROVIDER => Arc::new(crate::gcp::GcpSource::from_config(
            target, settings, http,
        )?),
        #[cfg(feature = "aws_rss")]
        crate::aws_rss::PROVIDER => Arc::new(crate::aws_rss::AwsRssSource::from_config(
            target, settings, http,
        )?),
        #[cfg(not(feature = "aws_rss"))]
        "aws_rss" => {
            return Err(ConfigurationError::ProviderDisabled {
                page: target.name.clone(),
                kind: target.kind.clone(),
            })
        }
        crate::betterstack::PROVIDER => Arc::new(
            crate::betterstack::BetterStackSource::from_config(target, settings, http)?,
        ),
        other => {
            return Err(ConfigurationError::UnknownProvider {
                page: target.name.clone(),
                kind: other.to_string(),
            })
        }
    };

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> SourceDefaults {
        SourceDefaults {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            user_agent: "statuswatch-test".to_string(),
        }
    }

    #[test]
    fn overrides_apply_per_target() {
        let mut target = TargetConfig::new("github", "statuspage", "https://www.githubstatus.com");
        target.interval = Some(Duration::from_secs(60));

        let settings = SourceSettings::resolve(&target, &defaults());
        assert_eq!(settings.interval, Duration::from_secs(60));
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.page, "github");
    }

    #[test]
    fn zero_overrides_fall_back() {
        let mut target = TargetConfig::new("github", "statuspage", "https://www.githubstatus.com");
        target.interval = Some(Duration::ZERO);
        target.timeout = Some(Duration::ZERO);

        let settings = SourceSettings::resolve(&target, &defaults());
        assert_eq!(settings.interval, Duration::from_secs(30));
        assert_eq!(settings.timeout, Duration::from_secs(10));
    }

    #[test]
    fn display_url_prefers_user_friendly() {
        let mut target = TargetConfig::new("gcp", "gcp", "https://status.cloud.google.com/incidents.json");
        assert_eq!(target.display_url(), "https://status.cloud.google.com/incidents.json");

        target.user_friendly_url = Some("https://status.cloud.google.com".to_string());
        assert_eq!(target.display_url(), "https://status.cloud.google.com");

        target.user_friendly_url = Some(String::new());
        assert_eq!(target.display_url(), "https://status.cloud.google.com/incidents.json");
    }

    #[test]
    fn builds_every_provider_in_order() {
        let mut betterstack = TargetConfig::new("uptime", "betterstack", "");
        betterstack.page_id = Some("123".to_string());
        betterstack.api_token = Some("secret".to_string());

        let targets = vec![
            TargetConfig::new("github", "statuspage", "www.githubstatus.com"),
            TargetConfig::new("cf", "cloudflare", ""),
            TargetConfig::new("resend", "instatus", "https://resend-status.com"),
            TargetConfig::new("docker", "statusio", "https://api.status.io/1.0/status/abc"),
            TargetConfig::new("ado", "azuredevops", ""),
            TargetConfig::new("gcp", "gcp", ""),
            betterstack,
        ];

        let built = build_sources(&targets, &defaults()).unwrap();
        let providers: Vec<&str> = built.iter().map(|t| t.source.provider()).collect();
        assert_eq!(
            providers,
            ["statuspage", "cloudflare", "instatus", "statusio", "azuredevops", "gcp", "betterstack"]
        );
        assert_eq!(built[0].meta.page, "github");
        assert_eq!(built[0].meta.url, "www.githubstatus.com");
        assert!(built.iter().all(|t| t.source.interval() == Duration::from_secs(30)));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let targets = vec![TargetConfig::new("pd", "pagerduty", "https://status.pagerduty.com")];

        let err = build_sources(&targets, &defaults()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownProvider {
                page: "pd".to_string(),
                kind: "pagerduty".to_string(),
            }
        );
    }

    #[test]
    fn missing_name_is_rejected() {
        let targets = vec![TargetConfig::new("", "gcp", "")];
        assert!(matches!(
            build_sources(&targets, &defaults()),
            Err(ConfigurationError::MissingField { field: "name", .. })
        ));
    }

    #[test]
    fn one_bad_target_fails_the_whole_build() {
        let targets = vec![
            TargetConfig::new("github", "statuspage", "www.githubstatus.com"),
            TargetConfig::new("uptime", "betterstack", ""),
        ];
        assert!(matches!(
            build_sources(&targets, &defaults()),
            Err(ConfigurationError::MissingField { kind: "betterstack", .. })
        ));
    }

    #[test]
    fn deserializes_from_json() {
        let target: TargetConfig = serde_json::from_str(
            r#"{
                "name": "aws",
                "type": "aws_rss",
                "interval": "2m",
                "feeds": [{"url": "https://status.aws.amazon.com/rss/ec2-us-east-1.rss", "service": "ec2", "region": "us-east-1"}]
            }"#,
        )
        .unwrap();

        assert_eq!(target.kind, "aws_rss");
        assert_eq!(target.interval, Some(Duration::from_secs(120)));
        assert_eq!(target.timeout, None);
        assert_eq!(target.feeds[0].service, "ec2");
        assert_eq!(target.feeds[0].region, "us-east-1");
    }
}
