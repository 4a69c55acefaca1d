use std::time::Duration;

use reqwest::StatusCode;

use crate::ports::spotify::{PlaybackApi, TrackSnapshot};
use crate::spotify_rs::types::SpotifyCurrentlyPlaying;

pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum PlaybackApiError {
    #[error("Access token was rejected")]
    Unauthorized,
    #[error("Unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(serde_json::Error),
}

/// Spotify player API client
pub struct SpotifyPlaybackClient {
    client: reqwest::Client,
    api_url: String,
    timeout: Duration,
}

impl SpotifyPlaybackClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_api_url(SPOTIFY_API_URL, timeout)
    }

    pub fn with_api_url(api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl PlaybackApi for SpotifyPlaybackClient {
    async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<TrackSnapshot>, PlaybackApiError> {
        let response = self
            .client
            .get(format!("{}/me/player/currently-playing", self.api_url))
            .bearer_auth(access_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(PlaybackApiError::FailedToSendRequest)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(PlaybackApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlaybackApiError::Status { status, body });
        }

        // Spotify answers 204 with no body when no device is active
        let body = response
            .bytes()
            .await
            .map_err(PlaybackApiError::FailedToSendRequest)?;
        if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let playing: SpotifyCurrentlyPlaying =
            serde_json::from_slice(&body).map_err(PlaybackApiError::FailedToParseResponse)?;

        Ok(playing.item.map(|item| TrackSnapshot {
            track_name: item.name,
            artist_names: item.artists.into_iter().map(|artist| artist.name).collect(),
        }))
    }
}
