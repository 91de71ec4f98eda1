//! Per-source snapshot cache.
//!
//! Each configured source owns one [`CacheSlot`]. The slot holds an immutable
//! [`CacheEntry`] behind a read-mostly lock; writers build a complete new entry
//! and swap it in, so readers only ever see a whole attempt.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use statuswatch_types::ProviderResult;

use crate::source::{Attempt, Source};
use crate::FetchError;

/// The latest fetch outcome for one source.
///
/// An entry is either never fetched (`outcome` is `None`) or holds the result
/// or error of one attempt together with that attempt's duration.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    /// Outcome of the last completed attempt, `None` before the first.
    pub outcome: Option<Result<ProviderResult, FetchError>>,
    /// How long the last attempt took.
    pub duration: Duration,
    /// When the last attempt finished.
    pub updated_at: Option<SystemTime>,
    /// Number of writes this slot has seen.
    pub generation: u64,
}

impl CacheEntry {
    /// Whether no attempt has completed yet.
    pub fn is_never_fetched(&self) -> bool {
        self.outcome.is_none()
    }

    /// The cached result, if the last attempt succeeded.
    pub fn result(&self) -> Option<&ProviderResult> {
        self.outcome.as_ref().and_then(|o| o.as_ref().ok())
    }

    /// The cached error, if the last attempt failed.
    pub fn error(&self) -> Option<&FetchError> {
        self.outcome.as_ref().and_then(|o| o.as_ref().err())
    }
}

/// Cache slot for a single source.
#[derive(Debug, Default)]
pub struct CacheSlot {
    entry: RwLock<Arc<CacheEntry>>,
    /// Held for the duration of a fetch so at most one attempt per source is
    /// in flight.
    fetching: tokio::sync::Mutex<()>,
}

impl CacheSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current entry. Never waits on network I/O.
    pub fn read(&self) -> Arc<CacheEntry> {
        self.entry.read().clone()
    }

    /// Replace the entry with the outcome of `attempt`.
    pub fn write(&self, attempt: Attempt) -> Arc<CacheEntry> {
        let mut entry = self.entry.write();
        let next = Arc::new(CacheEntry {
            outcome: Some(attempt.outcome),
            duration: attempt.duration,
            updated_at: Some(attempt.finished_at),
            generation: entry.generation + 1,
        });
        *entry = next.clone();
        next
    }

    /// Run one attempt against `source` and store it.
    pub async fn refresh(&self, source: &dyn Source) -> Arc<CacheEntry> {
        let _fetching = self.fetching.lock().await;
        let attempt = Attempt::run(source).await;
        self.write(attempt)
    }

    /// Get the current entry, fetching synchronously if the slot was never
    /// populated.
    ///
    /// If another fetch is already in flight the caller waits for it instead
    /// of starting a second one.
    pub async fn read_or_fetch(&self, source: &dyn Source) -> Arc<CacheEntry> {
        // Fast path: already populated
        let entry = self.read();
        if !entry.is_never_fetched() {
            return entry;
        }

        // Slow path: double-check once we own the fetch
        let _fetching = self.fetching.lock().await;
        let entry = self.read();
        if !entry.is_never_fetched() {
            return entry;
        }

        let attempt = Attempt::run(source).await;
        self.write(attempt)
    }
}

/// One cache slot per configured source, indexed by position.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    slots: Vec<CacheSlot>,
}

impl SnapshotCache {
    /// Create a cache with `len` empty slots.
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| CacheSlot::new()).collect(),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the cache has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Get the slot at `index`.
    pub fn slot(&self, index: usize) -> Option<&CacheSlot> {
        self.slots.get(index)
    }

    /// Read the entry at `index`.
    pub fn read(&self, index: usize) -> Option<Arc<CacheEntry>> {
        self.slot(index).map(CacheSlot::read)
    }

    /// Iterate over all slots in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &CacheSlot> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::ScriptedSource;
    use statuswatch_types::NormalizedStatus;

    fn result(page: &str, status: NormalizedStatus) -> ProviderResult {
        ProviderResult::builder("scripted", page)
            .component("API", |c| c.status(status))
            .build()
    }

    fn attempt(outcome: Result<ProviderResult, FetchError>) -> Attempt {
        Attempt {
            outcome,
            duration: Duration::from_millis(120),
            finished_at: SystemTime::now(),
        }
    }

    #[test]
    fn new_slot_is_never_fetched() {
        let slot = CacheSlot::new();
        let entry = slot.read();

        assert!(entry.is_never_fetched());
        assert!(entry.result().is_none());
        assert!(entry.error().is_none());
        assert_eq!(entry.generation, 0);
        assert!(entry.updated_at.is_none());
    }

    #[test]
    fn write_replaces_whole_entry() {
        let slot = CacheSlot::new();

        slot.write(attempt(Ok(result("a", NormalizedStatus::Operational))));
        let entry = slot.write(attempt(Err(FetchError::Timeout)));

        assert_eq!(entry.error(), Some(&FetchError::Timeout));
        assert!(entry.result().is_none());
        assert_eq!(entry.generation, 2);
        assert_eq!(entry.duration, Duration::from_millis(120));
    }

    #[test]
    fn readers_keep_their_snapshot_across_writes() {
        let slot = CacheSlot::new();
        slot.write(attempt(Ok(result("a", NormalizedStatus::Operational))));

        let before = slot.read();
        slot.write(attempt(Ok(result("a", NormalizedStatus::MajorOutage))));
        let after = slot.read();

        assert_eq!(
            before.result().unwrap().components[0].status,
            NormalizedStatus::Operational
        );
        assert_eq!(
            after.result().unwrap().components[0].status,
            NormalizedStatus::MajorOutage
        );
    }

    #[test]
    fn cache_indexes_slots_by_position() {
        let cache = SnapshotCache::new(3);
        assert_eq!(cache.len(), 3);

        cache
            .slot(1)
            .unwrap()
            .write(attempt(Ok(result("b", NormalizedStatus::Degraded))));

        assert!(cache.read(0).unwrap().is_never_fetched());
        assert!(!cache.read(1).unwrap().is_never_fetched());
        assert!(cache.read(2).unwrap().is_never_fetched());
        assert!(cache.read(3).is_none());
    }

    #[tokio::test]
    async fn read_or_fetch_fetches_once() {
        let source = ScriptedSource::new("a", Ok(result("a", NormalizedStatus::Operational)));
        let slot = CacheSlot::new();

        let first = slot.read_or_fetch(&source).await;
        let second = slot.read_or_fetch(&source).await;

        assert_eq!(source.fetches(), 1);
        assert_eq!(first.generation, 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn read_or_fetch_caches_failures_too() {
        let source = ScriptedSource::new("down", Err(FetchError::Status(500)));
        let slot = CacheSlot::new();

        slot.read_or_fetch(&source).await;
        let entry = slot.read_or_fetch(&source).await;

        assert_eq!(source.fetches(), 1);
        assert_eq!(entry.error(), Some(&FetchError::Status(500)));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_cold_reads_share_one_fetch() {
        let source = Arc::new(
            ScriptedSource::new("a", Ok(result("a", NormalizedStatus::Operational)))
                .with_latency(Duration::from_secs(1)),
        );
        let slot = Arc::new(CacheSlot::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let slot = slot.clone();
            let source = source.clone();
            handles.push(tokio::spawn(async move {
                slot.read_or_fetch(source.as_ref()).await.generation
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn refresh_always_fetches() {
        let source = ScriptedSource::new("a", Ok(result("a", NormalizedStatus::Operational)));
        let slot = CacheSlot::new();

        slot.refresh(&source).await;
        slot.refresh(&source).await;
        let entry = slot.refresh(&source).await;

        assert_eq!(source.fetches(), 3);
        assert_eq!(entry.generation, 3);
    }
}
