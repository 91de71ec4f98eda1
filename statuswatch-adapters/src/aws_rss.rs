//! AWS Service Health Dashboard adapter.
//!
//! AWS offers no unauthenticated summary, only per-service RSS feeds. Each
//! configured feed becomes one component whose status is inferred from the
//! newest item. A failure on any feed fails the whole fetch.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use statuswatch_sdk::{FetchError, Source};
use statuswatch_types::{Component, NormalizedStatus, ProviderResult};
use tokio::time::Instant;
use tracing::debug;

use crate::config::{FeedConfig, SourceSettings, TargetConfig};
use crate::http::{body, expect_ok, send, validate_url, HttpClient};
use crate::ConfigurationError;

/// Provider type name.
pub const PROVIDER: &str = "aws_rss";

/// Source aggregating several AWS RSS feeds.
#[derive(Debug, Clone)]
pub struct AwsRssSource {
    settings: SourceSettings,
    http: HttpClient,
    feeds: Vec<FeedConfig>,
}

impl AwsRssSource {
    /// Create a source reading `feeds` in order.
    pub fn new(settings: SourceSettings, http: HttpClient, feeds: Vec<FeedConfig>) -> Self {
        Self {
            settings,
            http,
            feeds,
        }
    }

    pub(crate) fn from_config(
        target: &TargetConfig,
        settings: SourceSettings,
        http: HttpClient,
    ) -> Result<Self, ConfigurationError> {
        for feed in &target.feeds {
            let url = target.require(PROVIDER, "feeds[].url", Some(&feed.url))?;
            target.require(PROVIDER, "feeds[].service", Some(&feed.service))?;
            validate_url(&target.name, url)?;
        }
        Ok(Self::new(settings, http, target.feeds.clone()))
    }

    async fn fetch_feed(&self, feed: &FeedConfig, deadline: Instant) -> Result<Component, FetchError> {
        let response = expect_ok(send(self.http.get(&feed.url, deadline)).await?)?;
        let body = body(response).await?;
        let text = String::from_utf8_lossy(&body);

        let rss: Rss = quick_xml::de::from_str(&text).map_err(|e| FetchError::Parse(e.to_string()))?;
        let status = infer_status(&rss);

        let name = if feed.region.is_empty() {
            feed.service.clone()
        } else {
            format!("{} ({})", feed.service, feed.region)
        };
        Ok(Component::new(name, status).with_region(feed.region.as_str()))
    }
}

#[async_trait]
impl Source for AwsRssSource {
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
        let mut result = ProviderResult::new(PROVIDER, &self.settings.page);

        for feed in &self.feeds {
            debug!(page = %self.settings.page, url = %feed.url, "aws rss fetch");
            result.components.push(self.fetch_feed(feed, deadline).await?);
        }

        Ok(result)
    }
}

#[derive(Debug, Default, Deserialize)]
struct Rss {
    #[serde(default)]
    channel: Channel,
}

#[derive(Debug, Default, Deserialize)]
struct Channel {
    #[serde(default, rename = "item")]
    items: Vec<Item>,
}

#[derive(Debug, Default, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

fn infer_status(rss: &Rss) -> NormalizedStatus {
    match rss.channel.items.first() {
        Some(latest) => infer_item_status(&format!("{} {}", latest.title, latest.description)),
        None => NormalizedStatus::Unknown,
    }
}

/// Infer a status from the wording of a feed item.
pub fn infer_item_status(text: &str) -> NormalizedStatus {
    let t = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| t.contains(w));

    if has(&["operating normally", "resolved", "restored"]) {
        NormalizedStatus::Operational
    } else if has(&["degraded", "elevated", "increased", "impact"]) {
        NormalizedStatus::Degraded
    } else if has(&["outage", "unavailable"]) {
        NormalizedStatus::MajorOutage
    } else {
        NormalizedStatus::Unknown
    }
}
