use crate::models::{FailedCandidate, FailureStatus, MatchConfidence, ResolvedTrack, TrackRecommendation};
use async_trait::async_trait;
use log::{debug, warn};
use rspotify::{
    model::{FullTrack, SearchResult, SearchType},
    prelude::*,
    AuthCodeSpotify,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The exact query asks for a single result; the artist-only fallback casts
/// a wider net.
pub const EXACT_LIMIT: u32 = 1;
pub const FALLBACK_LIMIT: u32 = 5;

const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Spotify API error: {0}")]
    Spotify(#[from] rspotify::ClientError),
    #[error("search timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected search response shape")]
    UnexpectedResponse,
}

/// One track record returned by the search index.
#[derive(Debug, Clone)]
pub struct TrackHit {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
}

impl TrackHit {
    fn from_full_track(track: FullTrack) -> Option<Self> {
        // Local files carry no id and cannot be added to a playlist.
        let id = track.id?;
        Some(Self {
            uri: id.uri(),
            id: id.id().to_string(),
            name: track.name,
            artists: track.artists.iter().map(|a| a.name.clone()).collect(),
        })
    }
}

/// Search seam for the streaming service.
///
/// `prepare` refreshes credentials and is called exactly once per pipeline
/// run, before any search; its failure is fatal for the whole batch.
#[async_trait]
pub trait TrackSearcher: Send + Sync {
    async fn prepare(&self) -> Result<(), SearchError> {
        Ok(())
    }

    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<TrackHit>, SearchError>;
}

/// Production searcher backed by the Spotify Web API.
pub struct SpotifySearcher {
    spotify: Arc<AuthCodeSpotify>,
}

impl SpotifySearcher {
    pub fn new(spotify: AuthCodeSpotify) -> Self {
        Self {
            spotify: Arc::new(spotify),
        }
    }
}

#[async_trait]
impl TrackSearcher for SpotifySearcher {
    async fn prepare(&self) -> Result<(), SearchError> {
        self.spotify.refresh_token().await?;
        Ok(())
    }

    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<TrackHit>, SearchError> {
        let result = self
            .spotify
            .search(query, SearchType::Track, None, None, Some(limit), None)
            .await?;

        match result {
            SearchResult::Tracks(page) => Ok(page
                .items
                .into_iter()
                .filter_map(TrackHit::from_full_track)
                .collect()),
            _ => Err(SearchError::UnexpectedResponse),
        }
    }
}

/// Outcome of resolving a single candidate. Failures are data, not errors;
/// a single candidate must never abort the batch.
#[derive(Debug)]
pub enum Resolution {
    Resolved(ResolvedTrack),
    Failed(FailedCandidate),
}

/// Maps one model candidate to a playable track via search.
pub struct Resolver {
    searcher: Arc<dyn TrackSearcher>,
    search_timeout: Duration,
}

impl Resolver {
    pub fn new(searcher: Arc<dyn TrackSearcher>) -> Self {
        Self::with_timeout(searcher, DEFAULT_SEARCH_TIMEOUT)
    }

    pub fn with_timeout(searcher: Arc<dyn TrackSearcher>, search_timeout: Duration) -> Self {
        Self {
            searcher,
            search_timeout,
        }
    }

    /// Two-step resolution: a field-scoped artist+title query first, then an
    /// artist-only query taking the first of up to [`FALLBACK_LIMIT`] hits.
    pub async fn resolve(&self, rec: TrackRecommendation) -> Resolution {
        if rec.artist.trim().is_empty() && rec.title.trim().is_empty() {
            return Resolution::Failed(FailedCandidate {
                source: rec,
                status: FailureStatus::NotFound,
                error_detail: None,
            });
        }

        match self.try_resolve(&rec).await {
            Ok(Some((hit, confidence))) => {
                debug!(
                    "resolved '{} - {}' to {} ({:?})",
                    rec.artist, rec.title, hit.id, confidence
                );
                Resolution::Resolved(ResolvedTrack {
                    track_id: hit.id,
                    uri: hit.uri,
                    confidence,
                    source: rec,
                })
            }
            Ok(None) => Resolution::Failed(FailedCandidate {
                source: rec,
                status: FailureStatus::NotFound,
                error_detail: None,
            }),
            Err(e) => {
                warn!("search failed for '{} - {}': {}", rec.artist, rec.title, e);
                Resolution::Failed(FailedCandidate {
                    source: rec,
                    status: FailureStatus::Error,
                    error_detail: Some(e.to_string()),
                })
            }
        }
    }

    async fn try_resolve(
        &self,
        rec: &TrackRecommendation,
    ) -> Result<Option<(TrackHit, MatchConfidence)>, SearchError> {
        let exact_query = format!(r#"artist:"{}" track:"{}""#, rec.artist, rec.title);
        let hits = self.search(&exact_query, EXACT_LIMIT).await?;
        if let Some(hit) = hits.into_iter().next() {
            return Ok(Some((hit, MatchConfidence::Exact)));
        }

        let fallback_query = format!(r#"artist:"{}""#, rec.artist);
        let hits = self.search(&fallback_query, FALLBACK_LIMIT).await?;
        // First hit taken as-is. TODO: rank fallback hits by title similarity
        // before accepting one; the first result can be a different song.
        Ok(hits.into_iter().next().map(|hit| (hit, MatchConfidence::Fallback)))
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<TrackHit>, SearchError> {
        match tokio::time::timeout(self.search_timeout, self.searcher.search_tracks(query, limit))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(self.search_timeout)),
        }
    }
}
