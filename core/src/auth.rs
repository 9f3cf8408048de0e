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

use rspotify::{prelude::*, scopes, AuthCodeSpotify, Config, Credentials, OAuth};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to initialize Spotify client: {0}")]
    ClientConfig(String),
    #[error("Spotify authentication failed: {0}")]
    Spotify(#[from] rspotify::ClientError),
}

/// Initializes and authenticates a Spotify client using the Authorization Code Flow.
///
/// Reads `RSPOTIFY_CLIENT_ID`, `RSPOTIFY_CLIENT_SECRET` and
/// `RSPOTIFY_REDIRECT_URI` from the environment, requests the playlist
/// scopes the generator needs, and caches the token to disk so subsequent
/// runs refresh it silently. If no valid token is cached, the user is
/// prompted (via browser or stdout) to authorize the application once.
pub async fn get_spotify_client() -> Result<AuthCodeSpotify, AuthError> {
    let creds = Credentials::from_env().ok_or_else(|| {
        AuthError::ClientConfig("Missing RSPOTIFY_CLIENT_ID or RSPOTIFY_CLIENT_SECRET".to_string())
    })?;

    // - playlist-modify-private/-public: to create the generated playlist.
    // - playlist-read-private: to report back what was created.
    let scopes = scopes!(
        "playlist-modify-private",
        "playlist-modify-public",
        "playlist-read-private"
    );

    let oauth = OAuth::from_env(scopes)
        .ok_or_else(|| AuthError::ClientConfig("Missing RSPOTIFY_REDIRECT_URI".to_string()))?;

    // Cached, self-refreshing token: the one refresh a pipeline run performs
    // happens through this client before the batch starts.
    let config = Config {
        token_cached: true,
        token_refreshing: true,
        ..Default::default()
    };

    let spotify = AuthCodeSpotify::with_config(creds, oauth, config);

    let url = spotify.get_authorize_url(false)?;
    spotify.prompt_for_token(&url).await?;

    Ok(spotify)
}
