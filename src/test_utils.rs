use std::sync::Arc;

use crate::credentials::{ClientCredentials, CredentialStore};
use crate::persistence::MockKeyValueStore;
use crate::ports::spotify::TrackSnapshot;
use crate::spotify_rs::types::SpotifyTokenResponse;

pub fn client_credentials() -> ClientCredentials {
    ClientCredentials {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        redirect_uri: "http://localhost:3000/callback".into(),
    }
}

pub fn credential_store(
    refresh_token: &str,
    access_token: &str,
    store: MockKeyValueStore,
) -> Arc<CredentialStore> {
    Arc::new(CredentialStore::with_tokens(
        client_credentials(),
        refresh_token,
        access_token,
        Arc::new(store),
    ))
}

pub fn token_response(access_token: &str, refresh_token: Option<&str>) -> SpotifyTokenResponse {
    SpotifyTokenResponse {
        access_token: access_token.into(),
        token_type: "Bearer".into(),
        expires_in: 3600,
        refresh_token: refresh_token.map(Into::into),
        scope: Some("user-read-playback-state".into()),
    }
}

pub fn track(name: &str, artists: &[&str]) -> TrackSnapshot {
    TrackSnapshot {
        track_name: name.into(),
        artist_names: artists.iter().map(|artist| artist.to_string()).collect(),
    }
}
