//! # statuswatch-sdk
//!
//! Background refresh, snapshot caching and metric assembly for third-party
//! status pages.
//!
//! Each configured target is a [`Source`]. The [`Exporter`] gives every
//! source its own cache slot and refresh loop, and assembles gauges from the
//! cached state whenever metrics are scraped. Scrapes never wait on upstream
//! I/O, except once for a source that has never been fetched.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use statuswatch_sdk::{Exporter, Source, Target};
//! use statuswatch_sdk::prometheus::PrometheusConfig;
//!
//! # fn github() -> Arc<dyn Source> { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let exporter = Exporter::builder()
//!         .target(Target::new(github(), "https://www.githubstatus.com"))
//!         .build();
//!
//!     // Refresh every source on its own interval (non-blocking)
//!     let _refresh = exporter.start();
//!
//!     // Serve metrics until the process exits
//!     exporter.serve(&PrometheusConfig::default()).await?.run().await
//! }
//! ```
//!
//! ## Features
//!
//! - **Independent refresh**: one task per source, slow sources only delay themselves
//! - **Bounded fetches**: every attempt is cut off at the source's timeout
//! - **Atomic snapshots**: readers always see one complete attempt
//! - **Prometheus**: text exposition and an HTTP endpoint (`prometheus` feature)

mod assembler;
mod cache;
mod error;
mod exporter;
mod scheduler;
mod source;

#[cfg(feature = "prometheus")]
pub mod prometheus;

pub use assembler::{AssemblerOptions, MetricAssembler, MetricKind, MetricSet, Sample};
pub use cache::{CacheEntry, CacheSlot, SnapshotCache};
pub use error::FetchError;
pub use exporter::{Exporter, ExporterBuilder};
pub use scheduler::{RefreshScheduler, SchedulerHandle};
pub use source::{Attempt, Source, Target};

// Re-export types for convenience
pub use statuswatch_types::{Component, NormalizedStatus, PageMeta, ProviderResult};
