//! The main Exporter type tying the cache, scheduler and assembler together.

use std::sync::Arc;

use statuswatch_types::PageMeta;

use crate::assembler::{AssemblerOptions, MetricAssembler, MetricSet};
use crate::cache::SnapshotCache;
use crate::scheduler::{RefreshScheduler, SchedulerHandle};
use crate::source::{Source, Target};

/// The main entry point for exporting status pages as metrics.
///
/// An Exporter owns one cache slot per configured target, refreshes each
/// slot in the background and assembles metrics from the cached state on
/// demand.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use statuswatch_sdk::{Exporter, Source, Target};
///
/// # fn source() -> Arc<dyn Source> { unimplemented!() }
/// #[tokio::main]
/// async fn main() {
///     let exporter = Exporter::builder()
///         .target(Target::new(source(), "https://www.githubstatus.com"))
///         .build();
///
///     // Start background refresh
///     let _refresh = exporter.start();
///
///     // Render the current state
///     println!("{}", exporter.render(None).await);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Exporter {
    sources: Arc<[Arc<dyn Source>]>,
    cache: Arc<SnapshotCache>,
    assembler: Arc<MetricAssembler>,
}

impl Exporter {
    /// Create a builder for configuring the exporter.
    pub fn builder() -> ExporterBuilder {
        ExporterBuilder::new()
    }

    /// Number of configured targets.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if no targets are configured.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The snapshot cache, one slot per target in configuration order.
    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// The assembler used for scrapes.
    pub fn assembler(&self) -> &Arc<MetricAssembler> {
        &self.assembler
    }

    /// Start background refresh of every target.
    ///
    /// Returns a handle that stops refreshing when dropped.
    pub fn start(&self) -> SchedulerHandle {
        RefreshScheduler::new(self.sources.clone(), self.cache.clone()).start()
    }

    /// Assemble the metric set from current cache state.
    pub async fn collect(&self) -> MetricSet {
        self.assembler.collect().await
    }

    /// Assemble and render the current state in Prometheus text format.
    #[cfg(feature = "prometheus")]
    pub async fn render(&self, namespace: Option<&str>) -> String {
        crate::prometheus::format_prometheus(&self.collect().await, namespace)
    }

    /// Bind an HTTP server serving this exporter's metrics.
    #[cfg(feature = "prometheus")]
    pub async fn serve(
        &self,
        config: &crate::prometheus::PrometheusConfig,
    ) -> std::io::Result<crate::prometheus::PrometheusServer> {
        crate::prometheus::PrometheusServer::bind(config, self.assembler.clone()).await
    }
}

/// Builder for configuring an Exporter.
#[derive(Debug, Default)]
pub struct ExporterBuilder {
    targets: Vec<Target>,
    options: AssemblerOptions,
}

impl ExporterBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target.
    ///
    /// Targets are exported in the order they are added.
    pub fn target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    /// Add several targets.
    pub fn targets(mut self, targets: impl IntoIterator<Item = Target>) -> Self {
        self.targets.extend(targets);
        self
    }

    /// Report components with unknown status as up.
    ///
    /// Defaults to `false`.
    pub fn unknown_is_up(mut self, unknown_is_up: bool) -> Self {
        self.options.unknown_is_up = unknown_is_up;
        self
    }

    /// Build the exporter.
    pub fn build(self) -> Exporter {
        let (sources, pages): (Vec<Arc<dyn Source>>, Vec<PageMeta>) = self
            .targets
            .into_iter()
            .map(|target| (target.source, target.meta))
            .unzip();

        let sources: Arc<[Arc<dyn Source>]> = sources.into();
        let cache = Arc::new(SnapshotCache::new(sources.len()));
        let assembler = Arc::new(MetricAssembler::new(
            sources.clone(),
            pages.into(),
            cache.clone(),
            self.options,
        ));

        Exporter {
            sources,
            cache,
            assembler,
        }
    }
}
