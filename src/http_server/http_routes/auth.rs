use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::http_server::{error::CallbackError, state::AppState};
use crate::services::status_sync::SyncOutcome;
use crate::spotify_rs::auth::authorize_url;

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    /// Set by Spotify when the user denies access
    error: Option<String>,
}

/// Redirect the browser to the Spotify consent page.
pub async fn login(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let client = app_state.credentials.client();
    let url = authorize_url(
        &app_state.authorize_url,
        &client.client_id,
        &client.redirect_uri,
    );
    tracing::info!("Redirecting to Spotify authorization");

    (StatusCode::FOUND, [(header::LOCATION, url)])
}

/// Finish the authorization-code flow and push the first status right away.
#[axum::debug_handler]
pub async fn callback(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, CallbackError> {
    let code = match params.code {
        Some(code) if !code.is_empty() => code,
        _ => {
            return Err(CallbackError::MissingAuthorizationCode {
                provider_error: params.error,
            });
        }
    };

    let token = app_state.auth_server.exchange_code(&code).await?;
    tracing::info!(
        token_type = %token.token_type,
        scope = ?token.scope,
        expires_in = token.expires_in,
        "Obtained Spotify tokens from authorization code",
    );

    let refresh_token = token.refresh_token.filter(|token| !token.is_empty());
    if refresh_token.is_none() {
        tracing::warn!("Spotify did not return a refresh token, keeping the previous one");
    }
    if let Err(e) = app_state
        .refresher
        .seed(token.access_token, refresh_token)
        .await
    {
        tracing::error!(error = %e, "Failed to persist Spotify refresh token");
    }

    let message = match app_state.status_sync.sync_once().await {
        Ok(SyncOutcome::Published(_)) => {
            "Spotify authentication succeeded. Slack status updated."
        }
        Ok(SyncOutcome::NothingPlaying) => {
            "Spotify authentication succeeded. Nothing is playing right now."
        }
        Err(e) => {
            tracing::warn!(error = %e, "Initial status sync after login failed");
            "Spotify authentication succeeded. Slack status will update on the next poll."
        }
    };

    Ok((StatusCode::OK, message))
}
