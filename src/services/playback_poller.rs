use std::sync::Arc;

use tracing::instrument;

use crate::credentials::CredentialStore;
use crate::ports::spotify::{PlaybackApi, TrackSnapshot};
use crate::services::token_refresher::{RefreshError, TokenRefresher};
use crate::spotify_rs::client::PlaybackApiError;

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The access token was rejected. A refresh has already been attempted,
    /// the next tick will use the new token.
    #[error("Spotify rejected the access token")]
    Unauthorized,
    #[error("Failed to fetch the currently playing track: {0}")]
    Transient(#[source] PlaybackApiError),
    #[error("No access token available: {0}")]
    NoAccessToken(#[source] RefreshError),
}

impl PollError {
    /// Whether the next tick is expected to succeed without user action.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            PollError::NoAccessToken(RefreshError::RefreshTokenExpired(_))
        )
    }
}

pub struct PlaybackPoller {
    credentials: Arc<CredentialStore>,
    refresher: Arc<TokenRefresher>,
    playback: Arc<dyn PlaybackApi>,
}

impl PlaybackPoller {
    pub fn new(
        credentials: Arc<CredentialStore>,
        refresher: Arc<TokenRefresher>,
        playback: Arc<dyn PlaybackApi>,
    ) -> Self {
        Self {
            credentials,
            refresher,
            playback,
        }
    }

    /// Fetch the track Spotify is currently playing.
    ///
    /// Makes a single playback request and at most one token refresh. A 401
    /// triggers that refresh, unless this call already had to obtain a token
    /// first, and returns [`PollError::Unauthorized`] without retrying.
    ///
    /// # Errors
    /// See [`PollError`]. `Ok(None)` means nothing is playing.
    #[instrument(skip(self))]
    pub async fn poll(&self) -> Result<Option<TrackSnapshot>, PollError> {
        let mut access_token = self.credentials.access_token().await;
        let token_obtained = access_token.is_empty();
        if token_obtained {
            access_token = self
                .refresher
                .ensure_access_token()
                .await
                .map_err(PollError::NoAccessToken)?;
        }

        match self.playback.currently_playing(&access_token).await {
            Ok(Some(track)) => {
                tracing::debug!(
                    track = %track.track_name,
                    artists = ?track.artist_names,
                    "Fetched currently playing track",
                );
                Ok(Some(track))
            }
            Ok(None) => {
                tracing::debug!("Nothing is currently playing");
                Ok(None)
            }
            Err(PlaybackApiError::Unauthorized) if token_obtained => {
                tracing::warn!("Spotify rejected a freshly obtained access token");
                Err(PollError::Unauthorized)
            }
            Err(PlaybackApiError::Unauthorized) => {
                tracing::info!("Spotify access token expired, refreshing");
                // The refresher logs its own failures; the next tick picks up the new token
                let _ = self.refresher.refresh().await;
                Err(PollError::Unauthorized)
            }
            Err(e) => Err(PollError::Transient(e)),
        }
    }
}
