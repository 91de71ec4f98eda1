//! Metric assembly from cached state.
//!
//! On every scrape the [`MetricAssembler`] walks the cache slots in
//! configuration order and turns each entry into gauge samples. It never
//! fetches, except once for a slot that has never been populated.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use statuswatch_types::{Component, NormalizedStatus, PageMeta, ProviderResult};

use crate::cache::{CacheEntry, SnapshotCache};
use crate::source::Source;

/// The measurements produced per scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    /// Static per-target info, value is always 1.
    PageInfo,
    /// Duration of the last fetch in seconds.
    ScrapeDuration,
    /// 1 if the last fetch succeeded, 0 otherwise.
    ScrapeSuccess,
    /// Open incidents, only for providers that report them.
    OpenIncidents,
    /// 1 if the component is up, 0 otherwise.
    ComponentUp,
    /// Normalized status code of the component.
    ComponentStatus,
}

impl MetricKind {
    /// All kinds in exposition order.
    pub const ALL: [MetricKind; 6] = [
        MetricKind::PageInfo,
        MetricKind::ScrapeDuration,
        MetricKind::ScrapeSuccess,
        MetricKind::OpenIncidents,
        MetricKind::ComponentUp,
        MetricKind::ComponentStatus,
    ];

    /// Metric name without namespace.
    pub const fn name(self) -> &'static str {
        match self {
            MetricKind::PageInfo => "statuspage_page_info",
            MetricKind::ScrapeDuration => "statuspage_scrape_duration_seconds",
            MetricKind::ScrapeSuccess => "statuspage_scrape_success",
            MetricKind::OpenIncidents => "statuspage_open_incidents",
            MetricKind::ComponentUp => "statuspage_component_up",
            MetricKind::ComponentStatus => "statuspage_component_status_code",
        }
    }

    /// Help text.
    pub const fn help(self) -> &'static str {
        match self {
            MetricKind::PageInfo => "Static page info metric for dashboards; value is 1",
            MetricKind::ScrapeDuration => "Scrape duration by provider/page",
            MetricKind::ScrapeSuccess => "Scrape success (1=ok)",
            MetricKind::OpenIncidents => {
                "Open incidents reported by provider/page (when available)"
            }
            MetricKind::ComponentUp => "Component operational status (1=up, 0=not)",
            MetricKind::ComponentStatus => {
                "Component normalized status code (0=unknown,1=operational,2=maintenance,3=degraded,4=partial_outage,5=major_outage)"
            }
        }
    }

    /// Label names, in the order sample label values are stored.
    pub const fn label_names(self) -> &'static [&'static str] {
        match self {
            MetricKind::PageInfo => &["provider", "page", "url"],
            MetricKind::ScrapeDuration | MetricKind::ScrapeSuccess | MetricKind::OpenIncidents => {
                &["provider", "page"]
            }
            MetricKind::ComponentUp => &["provider", "page", "component", "group", "region"],
            MetricKind::ComponentStatus => {
                &["provider", "page", "component", "group", "region", "status"]
            }
        }
    }
}

/// A single gauge sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub kind: MetricKind,
    /// Label values, matching [`MetricKind::label_names`].
    pub labels: Vec<String>,
    pub value: f64,
}

impl Sample {
    fn new(kind: MetricKind, labels: Vec<String>, value: f64) -> Self {
        debug_assert_eq!(labels.len(), kind.label_names().len());
        Self {
            kind,
            labels,
            value,
        }
    }

    /// Value of the label called `name`.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.kind
            .label_names()
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
    }

    /// Iterate over `(name, value)` label pairs.
    pub fn label_pairs(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.kind
            .label_names()
            .iter()
            .copied()
            .zip(self.labels.iter().map(String::as_str))
    }
}

/// All samples produced by one scrape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet {
    samples: Vec<Sample>,
}

impl MetricSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// All samples in emission order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Samples of one kind, in emission order.
    pub fn of_kind(&self, kind: MetricKind) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter().filter(move |s| s.kind == kind)
    }

    /// Samples of one kind for a given provider and page.
    pub fn for_page<'a>(
        &'a self,
        kind: MetricKind,
        provider: &'a str,
        page: &'a str,
    ) -> impl Iterator<Item = &'a Sample> + 'a {
        self.of_kind(kind)
            .filter(move |s| s.label("provider") == Some(provider) && s.label("page") == Some(page))
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the set has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Rendering options for the assembler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerOptions {
    /// Report components in [`NormalizedStatus::Unknown`] as up.
    ///
    /// Off by default: only operational components count as up.
    pub unknown_is_up: bool,
}

/// Builds the metric set for a scrape from the snapshot cache.
#[derive(Debug, Clone)]
pub struct MetricAssembler {
    sources: Arc<[Arc<dyn Source>]>,
    pages: Arc<[PageMeta]>,
    cache: Arc<SnapshotCache>,
    options: AssemblerOptions,
}

impl MetricAssembler {
    /// Create an assembler reading `sources[i]` from cache slot `i`.
    pub fn new(
        sources: Arc<[Arc<dyn Source>]>,
        pages: Arc<[PageMeta]>,
        cache: Arc<SnapshotCache>,
        options: AssemblerOptions,
    ) -> Self {
        debug_assert_eq!(sources.len(), cache.len());
        Self {
            sources,
            pages,
            cache,
            options,
        }
    }

    /// The rendering options in use.
    pub fn options(&self) -> AssemblerOptions {
        self.options
    }

    /// Assemble the metric set from current cache state.
    ///
    /// Slots that have never been populated are fetched once, concurrently,
    /// each bounded by its source's timeout. Every other slot is read without
    /// waiting.
    pub async fn collect(&self) -> MetricSet {
        let entries = join_all(
            self.sources
                .iter()
                .zip(self.cache.iter())
                .map(|(source, slot)| slot.read_or_fetch(source.as_ref())),
        )
        .await;

        let mut set = MetricSet::new();

        for page in self.pages.iter() {
            set.push(Sample::new(
                MetricKind::PageInfo,
                vec![page.provider.clone(), page.page.clone(), page.url.clone()],
                1.0,
            ));
        }

        for (source, entry) in self.sources.iter().zip(&entries) {
            self.append_entry(&mut set, source.provider(), source.page(), entry);
        }

        set
    }

    /// Append the samples for one cache entry.
    pub fn append_entry(
        &self,
        set: &mut MetricSet,
        provider: &str,
        page: &str,
        entry: &CacheEntry,
    ) {
        let Some(outcome) = &entry.outcome else {
            return;
        };

        let page_labels = || vec![provider.to_string(), page.to_string()];

        set.push(Sample::new(
            MetricKind::ScrapeDuration,
            page_labels(),
            entry.duration.as_secs_f64(),
        ));

        let result = match outcome {
            Ok(result) => result,
            Err(_) => {
                set.push(Sample::new(MetricKind::ScrapeSuccess, page_labels(), 0.0));
                return;
            }
        };

        set.push(Sample::new(MetricKind::ScrapeSuccess, page_labels(), 1.0));

        if let Some(open) = result.open_incidents {
            set.push(Sample::new(
                MetricKind::OpenIncidents,
                page_labels(),
                f64::from(open),
            ));
        }

        self.append_components(set, provider, page, result);
    }

    fn append_components(
        &self,
        set: &mut MetricSet,
        provider: &str,
        page: &str,
        result: &ProviderResult,
    ) {
        // provider and page are fixed per result, so the component fields are
        // enough to identify a series
        let mut seen_up: HashSet<(&str, &str, &str)> = HashSet::new();
        let mut seen_status: HashSet<(&str, &str, &str, NormalizedStatus)> = HashSet::new();

        for component in &result.components {
            let Component {
                name,
                group,
                region,
                status,
            } = component;

            let labels = || {
                vec![
                    provider.to_string(),
                    page.to_string(),
                    name.clone(),
                    group.clone(),
                    region.clone(),
                ]
            };

            if seen_up.insert((name.as_str(), group.as_str(), region.as_str())) {
                set.push(Sample::new(
                    MetricKind::ComponentUp,
                    labels(),
                    if self.is_up(*status) { 1.0 } else { 0.0 },
                ));
            }

            if seen_status.insert((name.as_str(), group.as_str(), region.as_str(), *status)) {
                let mut labels = labels();
                labels.push(status.as_str().to_string());
                set.push(Sample::new(
                    MetricKind::ComponentStatus,
                    labels,
                    f64::from(status.code()),
                ));
            }
        }
    }

    fn is_up(&self, status: NormalizedStatus) -> bool {
        status.is_operational() || (self.options.unknown_is_up && status == NormalizedStatus::Unknown)
    }
}
