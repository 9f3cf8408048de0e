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

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Canonical, validated request for one pipeline run.
///
/// Produced by [`crate::criteria::normalize`]; `genres` is never empty and
/// `song_count` is always positive once a value of this type exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistCriteria {
    pub genres: Vec<String>,
    pub subgenres: Vec<String>,
    pub regions: Vec<String>,
    pub languages: Vec<String>,
    pub moods: Vec<String>,
    pub eras: Vec<String>,
    /// Obscurity bias, 1 (mainstream) to 10 (hidden gems).
    pub uniqueness: u8,
    pub song_count: u32,
    pub user_prompt: Option<String>,
}

/// One candidate proposed by the model, not yet verified to exist on Spotify.
///
/// The model may omit `artist` or `title`; serde fills them with empty
/// strings and the candidate fails resolution instead of crashing the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackRecommendation {
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub album: Option<String>,
    /// Models answer years as strings or bare numbers; accept both.
    #[serde(default, deserialize_with = "year_as_string")]
    pub year: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

fn year_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

/// How a candidate was matched against the Spotify search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    /// A combined artist+title query returned a hit.
    Exact,
    /// Only the artist-scoped query returned hits; the first one was taken.
    Fallback,
}

/// A candidate successfully matched to a playable track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedTrack {
    pub source: TrackRecommendation,
    pub track_id: String,
    pub uri: String,
    pub confidence: MatchConfidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStatus {
    /// Neither the exact nor the fallback query returned a hit.
    NotFound,
    /// A transport, auth, or timeout error interrupted resolution.
    Error,
}

/// A candidate that could not be resolved or that errored during search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedCandidate {
    pub source: TrackRecommendation,
    pub status: FailureStatus,
    pub error_detail: Option<String>,
}

impl fmt::Display for FailedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let why = match self.status {
            FailureStatus::NotFound => "no match on Spotify".to_string(),
            FailureStatus::Error => format!(
                "error: {}",
                self.error_detail.as_deref().unwrap_or("unknown")
            ),
        };
        write!(f, "{} - {} -> {}", self.source.artist, self.source.title, why)
    }
}

/// Aggregate result of one pipeline run.
///
/// `found + not_found == total` for completed runs; a cancelled run carries
/// `partial = true` and only the candidates processed before cancellation.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub resolved: Vec<ResolvedTrack>,
    pub failed: Vec<FailedCandidate>,
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
    pub partial: bool,
}

impl GenerationOutcome {
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when every candidate failed; the caller should tell the user
    /// nothing could be matched. Not an error at the pipeline layer.
    pub fn is_barren(&self) -> bool {
        self.total > 0 && self.found == 0
    }
}

/// Playlist created on the user's account by a publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedPlaylist {
    pub id: String,
    pub url: String,
    pub name: String,
}
