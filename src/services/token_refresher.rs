use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::instrument;

use crate::credentials::CredentialStore;
use crate::persistence::PersistError;
use crate::ports::spotify::AuthorizationServer;
use crate::spotify_rs::auth::TokenEndpointError;

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// Spotify reported `invalid_grant`; the user has to log in again.
    #[error("Refresh token is no longer valid, a new login is required: {0}")]
    RefreshTokenExpired(String),
    #[error("Spotify accounts service error: {0}")]
    AuthService(#[source] TokenEndpointError),
}

impl From<TokenEndpointError> for RefreshError {
    fn from(error: TokenEndpointError) -> Self {
        match error {
            TokenEndpointError::InvalidGrant { description } => {
                RefreshError::RefreshTokenExpired(description)
            }
            other => RefreshError::AuthService(other),
        }
    }
}

/// Trades the refresh token for a fresh access token.
pub struct TokenRefresher {
    credentials: Arc<CredentialStore>,
    auth_server: Arc<dyn AuthorizationServer>,
    in_flight: Mutex<()>,
}

impl TokenRefresher {
    pub fn new(
        credentials: Arc<CredentialStore>,
        auth_server: Arc<dyn AuthorizationServer>,
    ) -> Self {
        Self {
            credentials,
            auth_server,
            in_flight: Mutex::new(()),
        }
    }

    /// Refresh the access token unconditionally.
    ///
    /// Refreshes never overlap: a caller arriving while another refresh is
    /// running waits for it and then performs its own.
    ///
    /// # Errors
    /// [`RefreshError::RefreshTokenExpired`] when the refresh token is dead,
    /// [`RefreshError::AuthService`] for anything transient. Tokens are left
    /// untouched on error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let _guard = self.in_flight.lock().await;
        self.refresh_locked().await.map(|_| ())
    }

    /// Return the current access token, refreshing first if there is none.
    ///
    /// # Errors
    /// Same as [`TokenRefresher::refresh`].
    pub async fn ensure_access_token(&self) -> Result<String, RefreshError> {
        let _guard = self.in_flight.lock().await;

        // Another refresh may have finished while we were waiting for the lock
        let access_token = self.credentials.access_token().await;
        if !access_token.is_empty() {
            return Ok(access_token);
        }

        tracing::info!("No access token available, refreshing");
        self.refresh_locked().await
    }

    /// Install tokens obtained outside a refresh, e.g. from a new login.
    ///
    /// Waits for any refresh in flight, so a refresh that started with the
    /// old refresh token cannot overwrite these tokens afterwards.
    ///
    /// # Errors
    /// Returns [`PersistError`] if the refresh token could not be persisted.
    pub async fn seed(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<(), PersistError> {
        let _guard = self.in_flight.lock().await;
        self.credentials
            .set_tokens(access_token, refresh_token)
            .await
    }

    async fn refresh_locked(&self) -> Result<String, RefreshError> {
        let refresh_token = self.credentials.refresh_token().await;
        if refresh_token.is_empty() {
            tracing::warn!("Refreshing without a refresh token, expect Spotify to reject it");
        }

        let response = match self.auth_server.refresh(&refresh_token).await {
            Ok(response) => response,
            Err(error) => {
                let error = RefreshError::from(error);
                match &error {
                    RefreshError::RefreshTokenExpired(reason) => tracing::error!(
                        reason = %reason,
                        "Spotify refresh token expired, visit /login to authorize again",
                    ),
                    RefreshError::AuthService(source) => tracing::warn!(
                        error = %source,
                        "Failed to refresh Spotify access token",
                    ),
                }
                return Err(error);
            }
        };

        // Spotify may or may not rotate the refresh token
        let rotated = response.refresh_token.filter(|token| !token.is_empty());
        let was_rotated = rotated.is_some();

        if let Err(e) = self
            .credentials
            .set_tokens(response.access_token.clone(), rotated)
            .await
        {
            tracing::error!(error = %e, "Failed to persist rotated refresh token");
        }

        tracing::info!(
            expires_in = response.expires_in,
            rotated = was_rotated,
            "Refreshed Spotify access token",
        );
        Ok(response.access_token)
    }
}
