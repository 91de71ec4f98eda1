//! Background refresh loops.
//!
//! Every source gets its own task which alternates between fetching and
//! sleeping for the source's interval. Tasks never coordinate: a slow or
//! failing source only ever delays itself.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::SnapshotCache;
use crate::source::Source;

/// Spawns and owns one refresh loop per source.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    sources: Arc<[Arc<dyn Source>]>,
    cache: Arc<SnapshotCache>,
}

impl RefreshScheduler {
    /// Create a scheduler writing `sources[i]` into `cache` slot `i`.
    pub fn new(sources: Arc<[Arc<dyn Source>]>, cache: Arc<SnapshotCache>) -> Self {
        debug_assert_eq!(sources.len(), cache.len());
        Self { sources, cache }
    }

    /// Start one refresh loop per source.
    ///
    /// The first fetch happens immediately. Must be called from within a
    /// tokio runtime.
    pub fn start(&self) -> SchedulerHandle {
        let tasks = self
            .sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let source = source.clone();
                let cache = self.cache.clone();
                tokio::spawn(refresh_loop(index, source, cache))
            })
            .collect();

        SchedulerHandle { tasks }
    }
}

async fn refresh_loop(index: usize, source: Arc<dyn Source>, cache: Arc<SnapshotCache>) {
    let Some(slot) = cache.slot(index) else {
        warn!(index, "no cache slot for source, refresh loop not started");
        return;
    };

    loop {
        let entry = slot.refresh(source.as_ref()).await;

        match &entry.outcome {
            Some(Ok(result)) => debug!(
                provider = source.provider(),
                page = source.page(),
                components = result.components.len(),
                duration_ms = entry.duration.as_millis() as u64,
                "refresh complete"
            ),
            Some(Err(err)) => warn!(
                provider = source.provider(),
                page = source.page(),
                error = %err,
                timed_out = err.is_timeout(),
                "refresh failed"
            ),
            None => {}
        }

        tokio::time::sleep(source.interval()).await;
    }
}

/// Handle for the running refresh loops.
///
/// Dropping the handle stops every loop.
#[derive(Debug)]
pub struct SchedulerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Number of running loops.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if no loops were started.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop all refresh loops.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
