use crate::spotify_rs::auth::TokenEndpointError;
use crate::spotify_rs::client::PlaybackApiError;
use crate::spotify_rs::types::SpotifyTokenResponse;

/// Decoupled representation of the track Spotify is currently playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSnapshot {
    pub track_name: String,
    pub artist_names: Vec<String>,
}

/// Port trait wrapping the Spotify accounts service (token endpoint).
///
/// Implementations live in `spotify_rs::auth` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuthorizationServer: Send + Sync {
    /// Exchange a one-time authorization code for an access/refresh token pair.
    async fn exchange_code(
        &self,
        code: &str,
    ) -> Result<SpotifyTokenResponse, TokenEndpointError>;

    /// Mint a new access token from a refresh token.
    async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<SpotifyTokenResponse, TokenEndpointError>;
}

/// Port trait wrapping the Spotify player API.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaybackApi: Send + Sync {
    /// `Ok(None)` when nothing is playing.
    async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<TrackSnapshot>, PlaybackApiError>;
}
