use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::persistence::{KeyValueStore, PersistError};

/// Key under which the refresh token is persisted.
pub const REFRESH_TOKEN_KEY: &str = "spotify_refresh_token";

/// Static Spotify application credentials.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Point-in-time copy of everything the store holds.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: String,
    pub access_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("has_refresh_token", &!self.refresh_token.is_empty())
            .field("has_access_token", &!self.access_token.is_empty())
            .finish()
    }
}

#[derive(Default)]
struct Tokens {
    access_token: String,
    refresh_token: String,
}

/// Owns the OAuth tokens for the single linked account.
///
/// Both tokens live behind one lock, so a reader never sees one half of an
/// update. Only the refresh token is persisted; the access token is
/// recomputed through a refresh after a restart.
pub struct CredentialStore {
    client: ClientCredentials,
    tokens: RwLock<Tokens>,
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(
        client: ClientCredentials,
        refresh_token: String,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            client,
            tokens: RwLock::new(Tokens {
                access_token: String::new(),
                refresh_token,
            }),
            store,
        }
    }

    #[cfg(test)]
    pub fn with_tokens(
        client: ClientCredentials,
        refresh_token: &str,
        access_token: &str,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            client,
            tokens: RwLock::new(Tokens {
                access_token: access_token.to_string(),
                refresh_token: refresh_token.to_string(),
            }),
            store,
        }
    }

    /// Build the store, preferring a refresh token persisted by an earlier
    /// login over the one supplied through the environment.
    pub fn load(
        client: ClientCredentials,
        fallback_refresh_token: Option<String>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, PersistError> {
        let refresh_token = match store.get(REFRESH_TOKEN_KEY)? {
            Some(token) if !token.is_empty() => {
                tracing::debug!("Using persisted refresh token");
                token
            }
            _ => fallback_refresh_token.unwrap_or_default(),
        };

        if refresh_token.is_empty() {
            tracing::warn!("No refresh token available, a login is required");
        }

        Ok(Self::new(client, refresh_token, store))
    }

    pub fn client(&self) -> &ClientCredentials {
        &self.client
    }

    pub async fn get(&self) -> Credentials {
        let tokens = self.tokens.read().await;
        Credentials {
            client_id: self.client.client_id.clone(),
            client_secret: self.client.client_secret.clone(),
            redirect_uri: self.client.redirect_uri.clone(),
            refresh_token: tokens.refresh_token.clone(),
            access_token: tokens.access_token.clone(),
        }
    }

    pub async fn access_token(&self) -> String {
        self.tokens.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> String {
        self.tokens.read().await.refresh_token.clone()
    }

    pub async fn set_access_token(&self, token: String) {
        self.tokens.write().await.access_token = token;
    }

    /// Replace the refresh token and persist it.
    ///
    /// # Errors
    /// Returns [`PersistError`] if the durable write fails. The in-memory
    /// token is updated regardless.
    pub async fn set_refresh_token(&self, token: String) -> Result<(), PersistError> {
        self.tokens.write().await.refresh_token = token.clone();
        self.persist_refresh_token(token).await
    }

    /// Replace the access token and, when given, the refresh token in a single
    /// write section. Persists at most once.
    ///
    /// # Errors
    /// Returns [`PersistError`] if a new refresh token could not be persisted.
    pub async fn set_tokens(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<(), PersistError> {
        {
            let mut tokens = self.tokens.write().await;
            tokens.access_token = access_token;
            if let Some(refresh_token) = &refresh_token {
                tokens.refresh_token = refresh_token.clone();
            }
        }

        match refresh_token {
            Some(refresh_token) => self.persist_refresh_token(refresh_token).await,
            None => Ok(()),
        }
    }

    // The store does blocking file I/O
    async fn persist_refresh_token(&self, token: String) -> Result<(), PersistError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.set(REFRESH_TOKEN_KEY, &token)).await?
    }
}
