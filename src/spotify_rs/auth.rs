use std::time::Duration;

use crate::credentials::ClientCredentials;
use crate::ports::spotify::AuthorizationServer;
use crate::spotify_rs::types::{SpotifyOAuthError, SpotifyTokenResponse};

pub const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Read-only access to the playback state is all the bridge needs
pub const SPOTIFY_SCOPE: &str = "user-read-playback-state";

/// Build the URL the user is redirected to in order to grant access.
pub fn authorize_url(auth_url: &str, client_id: &str, redirect_uri: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&scope={}&redirect_uri={}",
        auth_url,
        urlencoding::encode(client_id),
        urlencoding::encode(SPOTIFY_SCOPE),
        urlencoding::encode(redirect_uri)
    )
}

#[derive(Debug, thiserror::Error)]
pub enum TokenEndpointError {
    /// The code or refresh token is dead; only a new interactive login helps.
    #[error("Invalid grant: {description}")]
    InvalidGrant { description: String },
    #[error("Token endpoint rejected the request ({status}): {reason}")]
    Rejected {
        status: reqwest::StatusCode,
        reason: String,
    },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// Client for the Spotify accounts service token endpoint
/// https://developer.spotify.com/documentation/web-api/tutorials/code-flow
pub struct SpotifyAuthClient {
    client: reqwest::Client,
    credentials: ClientCredentials,
    token_url: String,
    timeout: Duration,
}

impl SpotifyAuthClient {
    pub fn new(credentials: ClientCredentials, timeout: Duration) -> Self {
        Self::with_token_url(credentials, SPOTIFY_TOKEN_URL, timeout)
    }

    pub fn with_token_url(
        credentials: ClientCredentials,
        token_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            token_url: token_url.into(),
            timeout,
        }
    }

    async fn request_token(
        &self,
        params: &[(&str, &str)],
    ) -> Result<SpotifyTokenResponse, TokenEndpointError> {
        let response = self
            .client
            .post(&self.token_url)
            // Serializes to x-www-form-urlencoded and sets the header (as required by spotify)
            .form(params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(TokenEndpointError::FailedToSendRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error text".to_string());
            return Err(classify_error(status, body));
        }

        response
            .json()
            .await
            .map_err(TokenEndpointError::FailedToParseResponse)
    }
}

fn classify_error(status: reqwest::StatusCode, body: String) -> TokenEndpointError {
    match serde_json::from_str::<SpotifyOAuthError>(&body) {
        Ok(error) if error.error == "invalid_grant" => TokenEndpointError::InvalidGrant {
            description: error.error_description.unwrap_or(error.error),
        },
        _ => TokenEndpointError::Rejected {
            status,
            reason: body,
        },
    }
}

#[async_trait::async_trait]
impl AuthorizationServer for SpotifyAuthClient {
    async fn exchange_code(&self, code: &str) -> Result<SpotifyTokenResponse, TokenEndpointError> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ])
        .await
    }

    async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<SpotifyTokenResponse, TokenEndpointError> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::client_credentials;
    use httpmock::prelude::*;
    use serde_json::json;

    fn auth_client(server: &MockServer) -> SpotifyAuthClient {
        SpotifyAuthClient::with_token_url(
            client_credentials(),
            server.url("/api/token"),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_authorize_url() {
        let url = authorize_url(
            SPOTIFY_AUTH_URL,
            "test_client_id",
            "http://localhost:3000/callback",
        );

        assert!(url.starts_with(SPOTIFY_AUTH_URL));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("scope=user-read-playback-state"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcallback"));
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .form_urlencoded_tuple("grant_type", "authorization_code")
                .form_urlencoded_tuple("code", "the-code")
                .form_urlencoded_tuple("redirect_uri", "http://localhost:3000/callback")
                .form_urlencoded_tuple("client_id", "client-id")
                .form_urlencoded_tuple("client_secret", "client-secret");
            then.status(200).json_body(json!({
                "access_token": "at",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "rt",
                "scope": "user-read-playback-state"
            }));
        });

        let token = auth_client(&server).exchange_code("the-code").await.unwrap();

        mock.assert();
        assert_eq!(token.access_token, "at");
        assert_eq!(token.refresh_token.as_deref(), Some("rt"));
        assert_eq!(token.expires_in, 3600);
    }

    #[tokio::test]
    async fn test_refresh_without_rotation() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/token")
                .form_urlencoded_tuple("grant_type", "refresh_token")
                .form_urlencoded_tuple("refresh_token", "rt");
            then.status(200).json_body(json!({
                "access_token": "at-2",
                "token_type": "Bearer",
                "expires_in": 3600,
                "scope": "user-read-playback-state"
            }));
        });

        let token = auth_client(&server).refresh("rt").await.unwrap();

        assert_eq!(token.access_token, "at-2");
        assert!(token.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_refresh_invalid_grant() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/token");
            then.status(400).json_body(json!({
                "error": "invalid_grant",
                "error_description": "Refresh token revoked"
            }));
        });

        let error = auth_client(&server).refresh("dead").await.unwrap_err();

        match error {
            TokenEndpointError::InvalidGrant { description } => {
                assert_eq!(description, "Refresh token revoked");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refresh_server_error_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/token");
            then.status(503).body("upstream unavailable");
        });

        let error = auth_client(&server).refresh("rt").await.unwrap_err();

        assert!(matches!(
            error,
            TokenEndpointError::Rejected { status, .. } if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn test_other_oauth_error_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/token");
            then.status(400)
                .json_body(json!({ "error": "invalid_client" }));
        });

        let error = auth_client(&server).exchange_code("code").await.unwrap_err();

        assert!(matches!(error, TokenEndpointError::Rejected { .. }));
    }
}
