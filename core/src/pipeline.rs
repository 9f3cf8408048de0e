/*
    promptlist-rs | Generate Spotify playlists from music preferences with an LLM.
    Copyright (C) 2026  The promptlist authors

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::batch::{BatchConfig, CancelFlag, Orchestrator};
use crate::criteria::{self, CriteriaError, RawCriteria};
use crate::models::GenerationOutcome;
use crate::recommend::{GenerationError, RecommendationModel, RecommendationRequester};
use crate::resolve::{Resolver, SearchError, TrackSearcher};
use log::info;
use std::sync::Arc;
use thiserror::Error;

/// Whole-pipeline failures. Per-candidate resolution failures are not
/// errors; they come back inside the [`GenerationOutcome`].
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Caller error; retrying without correcting the input will not help.
    #[error("invalid criteria: {0}")]
    InvalidCriteria(#[from] CriteriaError),
    /// The model call failed or returned unusable content; the whole run is
    /// safe to retry.
    #[error("recommendation generation failed: {0}")]
    UpstreamGeneration(#[from] GenerationError),
    /// No candidate can be resolved without a valid token, so a failed
    /// refresh aborts the run before the batch starts.
    #[error("token refresh failed: {0}")]
    TokenRefresh(#[source] SearchError),
}

/// The full generation pipeline: normalize criteria, ask the model for
/// candidates, refresh the Spotify token once, then resolve the candidates
/// in paced batches.
///
/// Collaborators are injected so callers and tests choose the clients;
/// nothing here reaches into ambient state. Quota checks are the caller's
/// job before invoking a run.
pub struct Pipeline {
    requester: RecommendationRequester,
    searcher: Arc<dyn TrackSearcher>,
    orchestrator: Orchestrator,
}

impl Pipeline {
    pub fn new(
        model: Arc<dyn RecommendationModel>,
        searcher: Arc<dyn TrackSearcher>,
        config: BatchConfig,
    ) -> Self {
        let resolver = Resolver::new(Arc::clone(&searcher));
        Self {
            requester: RecommendationRequester::new(model),
            searcher,
            orchestrator: Orchestrator::new(resolver, config),
        }
    }

    pub async fn run(&self, raw: RawCriteria) -> Result<GenerationOutcome, PipelineError> {
        self.run_with_cancel(raw, CancelFlag::default()).await
    }

    pub async fn run_with_cancel(
        &self,
        raw: RawCriteria,
        cancel: CancelFlag,
    ) -> Result<GenerationOutcome, PipelineError> {
        let criteria = criteria::normalize(raw)?;
        info!(
            "generating {} tracks for genres {:?} (uniqueness {})",
            criteria.song_count, criteria.genres, criteria.uniqueness
        );

        let recommendations = self.requester.generate(&criteria).await?;
        if recommendations.is_empty() {
            info!("model proposed no tracks; returning empty outcome");
            return Ok(GenerationOutcome::empty());
        }

        self.searcher
            .prepare()
            .await
            .map_err(PipelineError::TokenRefresh)?;

        Ok(self
            .orchestrator
            .run_with_cancel(recommendations, cancel)
            .await)
    }
}
