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

use crate::models::PublishedPlaylist;
use async_trait::async_trait;
use log::info;
use rspotify::{
    model::{PlayableId, TrackId},
    prelude::*,
    AuthCodeSpotify,
};
use std::sync::Arc;
use thiserror::Error;

// Spotify caps additions at 100 tracks per request.
const ADD_TRACKS_CHUNK: usize = 100;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Spotify API error: {0}")]
    Spotify(#[from] rspotify::ClientError),
    #[error("invalid track URI: {0}")]
    InvalidUri(String),
    #[error("cannot publish a playlist with no tracks")]
    NoTracks,
}

/// Consumes the pipeline's resolved track URIs and creates the playlist on
/// the user's account. The pipeline's own obligation ends before this.
#[async_trait]
pub trait PlaylistPublisher: Send + Sync {
    async fn publish(
        &self,
        name: &str,
        description: &str,
        track_uris: &[String],
    ) -> Result<PublishedPlaylist, PublishError>;
}

pub struct SpotifyPublisher {
    spotify: Arc<AuthCodeSpotify>,
}

impl SpotifyPublisher {
    pub fn new(spotify: AuthCodeSpotify) -> Self {
        Self {
            spotify: Arc::new(spotify),
        }
    }
}

#[async_trait]
impl PlaylistPublisher for SpotifyPublisher {
    async fn publish(
        &self,
        name: &str,
        description: &str,
        track_uris: &[String],
    ) -> Result<PublishedPlaylist, PublishError> {
        if track_uris.is_empty() {
            return Err(PublishError::NoTracks);
        }

        let me = self.spotify.me().await?;
        let playlist = self
            .spotify
            .user_playlist_create(me.id, name, Some(false), Some(false), Some(description))
            .await?;

        for chunk in track_uris.chunks(ADD_TRACKS_CHUNK) {
            let ids = chunk
                .iter()
                .map(|uri| {
                    TrackId::from_uri(uri)
                        .map(PlayableId::Track)
                        .map_err(|_| PublishError::InvalidUri(uri.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            self.spotify
                .playlist_add_items(playlist.id.clone(), ids, None)
                .await?;
        }

        info!(
            "published playlist '{}' with {} tracks",
            name,
            track_uris.len()
        );

        Ok(PublishedPlaylist {
            id: playlist.id.to_string(),
            url: playlist
                .external_urls
                .get("spotify")
                .cloned()
                .unwrap_or_default(),
            name: playlist.name,
        })
    }
}
