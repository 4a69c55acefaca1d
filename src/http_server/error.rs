use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};

use crate::spotify_rs::auth::TokenEndpointError;

/// Failures of the OAuth callback, surfaced to the browser as status codes.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("Missing authorization code")]
    MissingAuthorizationCode { provider_error: Option<String> },
    #[error("Failed to exchange authorization code: {0}")]
    TokenExchange(#[from] TokenEndpointError),
}

// Tell axum how to convert `CallbackError` into a response.
impl IntoResponse for CallbackError {
    fn into_response(self) -> Response<Body> {
        match self {
            CallbackError::MissingAuthorizationCode { provider_error } => {
                tracing::warn!(
                    provider_error = ?provider_error,
                    "Callback called without an authorization code",
                );
                let message = match provider_error {
                    Some(error) => format!("No authorization code found (Spotify said: {error})."),
                    None => "No authorization code found.".to_string(),
                };
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            CallbackError::TokenExchange(error) => {
                tracing::error!(error = %error, "Failed to authenticate with Spotify");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to authenticate with Spotify.".to_string(),
                )
                    .into_response()
            }
        }
    }
}
