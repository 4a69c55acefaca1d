use serde::{Deserialize, Serialize};

/// Spotify OAuth token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub expires_in: u64,
    /// Only present on code exchange, or when Spotify rotates the token on refresh
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// OAuth error body returned by the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyOAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

/// Body of `GET /v1/me/player/currently-playing`
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyCurrentlyPlaying {
    /// `null` for ads, unknown items, or episodes when not requested
    pub item: Option<SpotifyPlayingItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlayingItem {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}
