use crate::models::{GenerationOutcome, TrackRecommendation};
use crate::resolve::{Resolution, Resolver};
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Spotify tolerates short bursts; five concurrent searches with a pause
/// between batches stays well under the rate limit.
pub const DEFAULT_CHUNK_SIZE: usize = 5;
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub chunk_size: usize,
    pub pacing_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            pacing_delay: DEFAULT_PACING_DELAY,
        }
    }
}

/// Inter-chunk pacing seam. Production sleeps on the tokio clock; tests
/// inject a pacer that only counts.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

pub struct FixedDelayPacer {
    delay: Duration,
}

impl FixedDelayPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Pacer for FixedDelayPacer {
    async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// Cooperative cancellation flag shared with the caller. Setting it stops
/// the orchestrator from issuing further chunks.
pub type CancelFlag = Arc<AtomicBool>;

/// Drives the resolver over all candidates with bounded concurrency and
/// inter-chunk pacing. Stateless across runs.
pub struct Orchestrator {
    resolver: Resolver,
    chunk_size: usize,
    pacer: Arc<dyn Pacer>,
}

impl Orchestrator {
    pub fn new(resolver: Resolver, config: BatchConfig) -> Self {
        Self::with_pacer(
            resolver,
            config.chunk_size,
            Arc::new(FixedDelayPacer::new(config.pacing_delay)),
        )
    }

    pub fn with_pacer(resolver: Resolver, chunk_size: usize, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            resolver,
            chunk_size: chunk_size.max(1),
            pacer,
        }
    }

    pub async fn run(&self, recommendations: Vec<TrackRecommendation>) -> GenerationOutcome {
        self.run_with_cancel(recommendations, CancelFlag::default())
            .await
    }

    /// Resolves all candidates chunk by chunk.
    ///
    /// Within a chunk every resolver call is dispatched before any is
    /// awaited; chunks are strictly sequential with the pacing pause in
    /// between but not after the last. A set cancel flag stops new chunks
    /// from being issued and marks the outcome as partial. No candidate is
    /// ever retried within a run.
    pub async fn run_with_cancel(
        &self,
        recommendations: Vec<TrackRecommendation>,
        cancel: CancelFlag,
    ) -> GenerationOutcome {
        let total = recommendations.len();
        let mut resolved = Vec::new();
        let mut failed = Vec::new();
        let mut partial = false;

        let mut remaining = recommendations.into_iter().peekable();
        let mut chunk_index = 0usize;

        while remaining.peek().is_some() {
            if cancel.load(Ordering::Relaxed) {
                partial = true;
                info!(
                    "run cancelled after {} of {} candidates",
                    resolved.len() + failed.len(),
                    total
                );
                break;
            }

            if chunk_index > 0 {
                self.pacer.pause().await;
            }

            let chunk: Vec<TrackRecommendation> =
                remaining.by_ref().take(self.chunk_size).collect();
            debug!(
                "dispatching chunk {} with {} candidates",
                chunk_index,
                chunk.len()
            );

            let resolutions =
                join_all(chunk.into_iter().map(|rec| self.resolver.resolve(rec))).await;
            for resolution in resolutions {
                match resolution {
                    Resolution::Resolved(track) => resolved.push(track),
                    Resolution::Failed(candidate) => failed.push(candidate),
                }
            }
            chunk_index += 1;
        }

        let found = resolved.len();
        let not_found = failed.len();
        info!(
            "batch finished: {} of {} matched, {} failed{}",
            found,
            total,
            not_found,
            if partial { " (partial)" } else { "" }
        );

        GenerationOutcome {
            resolved,
            failed,
            total,
            found,
            not_found,
            partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{SearchError, TrackHit, TrackSearcher};
    use std::sync::atomic::AtomicUsize;

    fn recs(n: usize) -> Vec<TrackRecommendation> {
        (0..n)
            .map(|i| TrackRecommendation {
                artist: format!("Artist {}", i),
                title: format!("Title {}", i),
                ..Default::default()
            })
            .collect()
    }

    /// Exact-matches every combined query.
    struct AlwaysExactSearcher;

    #[async_trait]
    impl TrackSearcher for AlwaysExactSearcher {
        async fn search_tracks(
            &self,
            query: &str,
            _limit: u32,
        ) -> Result<Vec<TrackHit>, SearchError> {
            Ok(vec![TrackHit {
                id: format!("id-{}", query.len()),
                uri: "spotify:track:stub".to_string(),
                name: "stub".to_string(),
                artists: vec![],
            }])
        }
    }

    struct AlwaysThrowingSearcher;

    #[async_trait]
    impl TrackSearcher for AlwaysThrowingSearcher {
        async fn search_tracks(
            &self,
            _query: &str,
            _limit: u32,
        ) -> Result<Vec<TrackHit>, SearchError> {
            Err(SearchError::UnexpectedResponse)
        }
    }

    #[derive(Default)]
    struct CountingPacer {
        pauses: AtomicUsize,
    }

    #[async_trait]
    impl Pacer for CountingPacer {
        async fn pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn orchestrator(
        searcher: Arc<dyn TrackSearcher>,
        pacer: Arc<CountingPacer>,
    ) -> Orchestrator {
        Orchestrator::with_pacer(Resolver::new(searcher), DEFAULT_CHUNK_SIZE, pacer)
    }

    #[tokio::test]
    async fn test_twelve_candidates_run_as_three_chunks() {
        let pacer = Arc::new(CountingPacer::default());
        let orchestrator = orchestrator(Arc::new(AlwaysExactSearcher), pacer.clone());

        let outcome = orchestrator.run(recs(12)).await;

        assert_eq!(outcome.total, 12);
        assert_eq!(outcome.found + outcome.not_found, 12);
        assert_eq!(outcome.found, 12);
        assert!(!outcome.partial);
        // Three chunks (5, 5, 2) mean two pauses, none after the last.
        assert_eq!(pacer.pauses.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_errors_still_complete_the_batch() {
        let pacer = Arc::new(CountingPacer::default());
        let orchestrator = orchestrator(Arc::new(AlwaysThrowingSearcher), pacer.clone());

        let outcome = orchestrator.run(recs(7)).await;

        assert_eq!(outcome.total, 7);
        assert_eq!(outcome.found, 0);
        assert_eq!(outcome.not_found, 7);
        assert!(outcome
            .failed
            .iter()
            .all(|f| f.status == crate::models::FailureStatus::Error));
        assert!(outcome.is_barren());
        assert!(!outcome.partial);
    }

    #[tokio::test]
    async fn test_exact_chunk_multiple_has_no_trailing_pause() {
        let pacer = Arc::new(CountingPacer::default());
        let orchestrator = orchestrator(Arc::new(AlwaysExactSearcher), pacer.clone());

        let outcome = orchestrator.run(recs(10)).await;

        assert_eq!(outcome.found, 10);
        assert_eq!(pacer.pauses.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_outcome() {
        let pacer = Arc::new(CountingPacer::default());
        let orchestrator = orchestrator(Arc::new(AlwaysExactSearcher), pacer.clone());

        let outcome = orchestrator.run(vec![]).await;

        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.found, 0);
        assert_eq!(outcome.not_found, 0);
        assert_eq!(pacer.pauses.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancellation_stops_new_chunks_and_flags_partial() {
        /// Sets the shared flag while resolving the first chunk, so the
        /// orchestrator sees it before issuing the second.
        struct CancellingSearcher {
            cancel: CancelFlag,
        }

        #[async_trait]
        impl TrackSearcher for CancellingSearcher {
            async fn search_tracks(
                &self,
                _query: &str,
                _limit: u32,
            ) -> Result<Vec<TrackHit>, SearchError> {
                self.cancel.store(true, Ordering::Relaxed);
                Ok(vec![TrackHit {
                    id: "id".to_string(),
                    uri: "spotify:track:id".to_string(),
                    name: "stub".to_string(),
                    artists: vec![],
                }])
            }
        }

        let cancel = CancelFlag::default();
        let pacer = Arc::new(CountingPacer::default());
        let orchestrator = orchestrator(
            Arc::new(CancellingSearcher {
                cancel: cancel.clone(),
            }),
            pacer.clone(),
        );

        let outcome = orchestrator.run_with_cancel(recs(12), cancel).await;

        assert!(outcome.partial);
        assert_eq!(outcome.total, 12);
        // Only the first chunk was processed.
        assert_eq!(outcome.found + outcome.not_found, DEFAULT_CHUNK_SIZE);
        assert_eq!(pacer.pauses.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_returns_immediately() {
        let cancel = CancelFlag::default();
        cancel.store(true, Ordering::Relaxed);
        let pacer = Arc::new(CountingPacer::default());
        let orchestrator = orchestrator(Arc::new(AlwaysExactSearcher), pacer.clone());

        let outcome = orchestrator.run_with_cancel(recs(4), cancel).await;

        assert!(outcome.partial);
        assert_eq!(outcome.total, 4);
        assert_eq!(outcome.found + outcome.not_found, 0);
    }
}
