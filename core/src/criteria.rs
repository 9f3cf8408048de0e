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

use crate::models::PlaylistCriteria;
use serde::Deserialize;
use thiserror::Error;

/// Raw questionnaire input as the caller hands it over.
///
/// Everything is optional and numbers are signed so that absent, null, and
/// negative values all survive deserialization and can be rejected with a
/// precise error instead of a serde failure.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawCriteria {
    pub genres: Option<Vec<String>>,
    pub subgenres: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub moods: Option<Vec<String>>,
    pub eras: Option<Vec<String>>,
    pub uniqueness: Option<i64>,
    pub song_count: Option<i64>,
    pub user_prompt: Option<String>,
}

#[derive(Error, Debug)]
pub enum CriteriaError {
    #[error("at least one genre is required")]
    MissingGenres,
    #[error("song count must be a positive integer, got {0:?}")]
    InvalidSongCount(Option<i64>),
    #[error("uniqueness must be between 1 and 10, got {0:?}")]
    InvalidUniqueness(Option<i64>),
}

/// Validates and flattens raw form input into a [`PlaylistCriteria`].
///
/// Pure transformation: list order is preserved, nothing is deduplicated,
/// and no defaults are invented. A missing `song_count` or `uniqueness` is
/// the caller's error, not something to paper over.
pub fn normalize(raw: RawCriteria) -> Result<PlaylistCriteria, CriteriaError> {
    let genres = raw.genres.unwrap_or_default();
    if genres.is_empty() {
        return Err(CriteriaError::MissingGenres);
    }

    let song_count = match raw.song_count {
        Some(n) if n > 0 => n as u32,
        other => return Err(CriteriaError::InvalidSongCount(other)),
    };

    let uniqueness = match raw.uniqueness {
        Some(n) if (1..=10).contains(&n) => n as u8,
        other => return Err(CriteriaError::InvalidUniqueness(other)),
    };

    let user_prompt = raw
        .user_prompt
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    Ok(PlaylistCriteria {
        genres,
        subgenres: raw.subgenres.unwrap_or_default(),
        regions: raw.regions.unwrap_or_default(),
        languages: raw.languages.unwrap_or_default(),
        moods: raw.moods.unwrap_or_default(),
        eras: raw.eras.unwrap_or_default(),
        uniqueness,
        song_count,
        user_prompt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_raw() -> RawCriteria {
        RawCriteria {
            genres: Some(vec!["rock".to_string()]),
            song_count: Some(10),
            uniqueness: Some(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_accepts_valid_criteria() {
        let criteria = normalize(valid_raw()).unwrap();
        assert_eq!(criteria.genres, vec!["rock"]);
        assert_eq!(criteria.song_count, 10);
        assert_eq!(criteria.uniqueness, 5);
        assert!(criteria.subgenres.is_empty());
        assert!(criteria.user_prompt.is_none());
    }

    #[test]
    fn test_rejects_empty_genres() {
        let mut raw = valid_raw();
        raw.genres = Some(vec![]);
        assert!(matches!(normalize(raw), Err(CriteriaError::MissingGenres)));

        let mut raw = valid_raw();
        raw.genres = None;
        assert!(matches!(normalize(raw), Err(CriteriaError::MissingGenres)));
    }

    #[test]
    fn test_rejects_bad_song_count() {
        for bad in [None, Some(0), Some(-3)] {
            let mut raw = valid_raw();
            raw.song_count = bad;
            assert!(matches!(
                normalize(raw),
                Err(CriteriaError::InvalidSongCount(_))
            ));
        }
    }

    #[test]
    fn test_rejects_out_of_range_uniqueness() {
        for bad in [None, Some(0), Some(11), Some(-1)] {
            let mut raw = valid_raw();
            raw.uniqueness = bad;
            assert!(matches!(
                normalize(raw),
                Err(CriteriaError::InvalidUniqueness(_))
            ));
        }
    }

    #[test]
    fn test_preserves_order_and_duplicates() {
        let mut raw = valid_raw();
        raw.moods = Some(vec![
            "dark".to_string(),
            "upbeat".to_string(),
            "dark".to_string(),
        ]);
        let criteria = normalize(raw).unwrap();
        assert_eq!(criteria.moods, vec!["dark", "upbeat", "dark"]);
    }

    #[test]
    fn test_trims_user_prompt_and_drops_blank() {
        let mut raw = valid_raw();
        raw.user_prompt = Some("  only live versions  ".to_string());
        assert_eq!(
            normalize(raw).unwrap().user_prompt.as_deref(),
            Some("only live versions")
        );

        let mut raw = valid_raw();
        raw.user_prompt = Some("   ".to_string());
        assert!(normalize(raw).unwrap().user_prompt.is_none());
    }

    #[test]
    fn test_deserializes_from_form_json() {
        let raw: RawCriteria = serde_json::from_str(
            r#"{"genres": ["jazz", "soul"], "song_count": 5, "uniqueness": 8, "eras": ["70s"]}"#,
        )
        .unwrap();
        let criteria = normalize(raw).unwrap();
        assert_eq!(criteria.genres.len(), 2);
        assert_eq!(criteria.eras, vec!["70s"]);
    }
}
