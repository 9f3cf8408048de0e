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

pub mod auth;
pub mod batch;
pub mod criteria;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod publish;
pub mod recommend;
pub mod resolve;

// Re-export key items for convenience
pub use auth::get_spotify_client;
pub use batch::{BatchConfig, CancelFlag, Orchestrator};
pub use criteria::{normalize, RawCriteria};
pub use models::{GenerationOutcome, PlaylistCriteria, TrackRecommendation};
pub use pipeline::{Pipeline, PipelineError};
pub use publish::{PlaylistPublisher, SpotifyPublisher};
pub use recommend::{AnthropicModel, RecommendationRequester};
pub use resolve::{Resolver, SpotifySearcher};
