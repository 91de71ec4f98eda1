//! The source capability contract.
//!
//! A [`Source`] is one configured target: it knows how to turn an upstream
//! status endpoint into a normalized [`ProviderResult`], and how often and how
//! long it may do so. Vendor-specific I/O and mapping stay behind `fetch`.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use statuswatch_types::{PageMeta, ProviderResult};
use tokio::time::Instant;

use crate::FetchError;

/// Trait for fetching the current state of one external target.
///
/// Implementations must not retry internally and must not share mutable
/// state with other sources.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use statuswatch_sdk::{FetchError, Source};
/// use statuswatch_types::{NormalizedStatus, ProviderResult};
/// use tokio::time::Instant;
///
/// #[derive(Debug)]
/// struct AlwaysUp;
///
/// #[async_trait]
/// impl Source for AlwaysUp {
///     fn provider(&self) -> &str { "static" }
///     fn page(&self) -> &str { "always-up" }
///     fn interval(&self) -> Duration { Duration::from_secs(30) }
///     fn timeout(&self) -> Duration { Duration::from_secs(5) }
///
///     async fn fetch(&self, _deadline: Instant) -> Result<ProviderResult, FetchError> {
///         Ok(ProviderResult::builder("static", "always-up")
///             .component("API", |c| c.status(NormalizedStatus::Operational))
///             .build())
///     }
/// }
/// ```
#[async_trait]
pub trait Source: Send + Sync + Debug {
    /// Provider kind, used as the `provider` label.
    fn provider(&self) -> &str;

    /// Configured page name, used as the `page` label.
    fn page(&self) -> &str;

    /// How often the refresh scheduler invokes [`Source::fetch`].
    fn interval(&self) -> Duration;

    /// Upper bound for a single [`Source::fetch`].
    fn timeout(&self) -> Duration;

    /// Fetch and normalize the current state.
    ///
    /// Work past `deadline` is abandoned by the caller and reported as
    /// [`FetchError::Timeout`].
    async fn fetch(&self, deadline: Instant) -> Result<ProviderResult, FetchError>;
}

/// A configured source paired with its static page metadata.
#[derive(Debug, Clone)]
pub struct Target {
    pub source: Arc<dyn Source>,
    pub meta: PageMeta,
}

impl Target {
    /// Pair a source with the URL to show on dashboards.
    pub fn new(source: Arc<dyn Source>, display_url: impl Into<String>) -> Self {
        let meta = PageMeta::new(source.provider(), source.page(), display_url);
        Self { source, meta }
    }
}

/// The outcome of one fetch attempt, with its timing.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub outcome: Result<ProviderResult, FetchError>,
    pub duration: Duration,
    pub finished_at: SystemTime,
}

impl Attempt {
    /// Run one fetch bounded by the source's timeout.
    pub async fn run(source: &dyn Source) -> Self {
        let started = Instant::now();
        let deadline = started + source.timeout();

        let outcome = match tokio::time::timeout_at(deadline, source.fetch(deadline)).await {
            Ok(outcome) => outcome,
            Err(elapsed) => Err(elapsed.into()),
        };

        Self {
            outcome,
            duration: started.elapsed(),
            finished_at: SystemTime::now(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted sources shared by the crate's tests.

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;

    /// A source that replays scripted outcomes and counts fetches.
    #[derive(Debug)]
    pub struct ScriptedSource {
        pub provider: String,
        pub page: String,
        pub interval: Duration,
        pub timeout: Duration,
        /// Simulated upstream latency.
        pub latency: Duration,
        script: Mutex<VecDeque<Result<ProviderResult, FetchError>>>,
        fallback: Result<ProviderResult, FetchError>,
        fetches: AtomicUsize,
    }

    impl ScriptedSource {
        pub fn new(page: &str, result: Result<ProviderResult, FetchError>) -> Self {
            Self {
                provider: "scripted".to_string(),
                page: page.to_string(),
                interval: Duration::from_secs(30),
                timeout: Duration::from_secs(5),
                latency: Duration::ZERO,
                script: Mutex::new(VecDeque::new()),
                fallback: result,
                fetches: AtomicUsize::new(0),
            }
        }

        pub fn with_interval(mut self, interval: Duration) -> Self {
            self.interval = interval;
            self
        }

        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        /// Queue an outcome returned before the fallback.
        pub fn then(self, outcome: Result<ProviderResult, FetchError>) -> Self {
            self.script.lock().push_back(outcome);
            self
        }

        pub fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Source for ScriptedSource {
        fn provider(&self) -> &str {
            &self.provider
        }

        fn page(&self) -> &str {
            &self.page
        }

        fn interval(&self) -> Duration {
            self.interval
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }

        async fn fetch(&self, _deadline: Instant) -> Result<ProviderResult, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            let next = self.script.lock().pop_front();
            next.unwrap_or_else(|| self.fallback.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedSource;
    use super::*;
    use statuswatch_types::NormalizedStatus;

    fn up(page: &str) -> ProviderResult {
        ProviderResult::builder("scripted", page)
            .component("API", |c| c.status(NormalizedStatus::Operational))
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_records_success() {
        let source = ScriptedSource::new("a", Ok(up("a"))).with_latency(Duration::from_millis(250));

        let attempt = Attempt::run(&source).await;

        assert_eq!(attempt.outcome.unwrap().components.len(), 1);
        assert!(attempt.duration >= Duration::from_millis(250));
        assert!(attempt.duration < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_past_deadline_is_a_timeout() {
        let source = ScriptedSource::new("slow", Ok(up("slow"))).with_latency(Duration::from_secs(60));

        let attempt = Attempt::run(&source).await;

        assert_eq!(attempt.outcome, Err(FetchError::Timeout));
        assert!(attempt.duration >= source.timeout);
        assert!(attempt.duration < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn attempt_records_failure() {
        let source = ScriptedSource::new("down", Err(FetchError::Status(503)));

        let attempt = Attempt::run(&source).await;

        assert_eq!(attempt.outcome, Err(FetchError::Status(503)));
    }

    #[test]
    fn target_derives_page_meta_from_source() {
        let source: Arc<dyn Source> = Arc::new(ScriptedSource::new("docs", Ok(up("docs"))));
        let target = Target::new(source, "https://status.example.com");

        assert_eq!(target.meta.provider, "scripted");
        assert_eq!(target.meta.page, "docs");
        assert_eq!(target.meta.url, "https://status.example.com");
    }
}
