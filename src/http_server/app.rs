use std::sync::Arc;

use axum::{Router, routing::get};
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::http_server::{
    http_routes::{auth, health},
    state::AppState,
};

pub struct HttpServerConfig {
    pub port: u16,
    pub app_state: Arc<AppState>,
}

pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}

/// Serve the login endpoints until `shutdown` resolves.
pub async fn start(
    config: HttpServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> color_eyre::Result<()> {
    let app = router(config.app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", config.port))?;
    tracing::info!(
        "Server started on http://localhost:{}, visit /login to link Spotify",
        config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MockKeyValueStore;
    use crate::ports::slack::MockStatusApi;
    use crate::ports::spotify::{MockAuthorizationServer, MockPlaybackApi};
    use crate::services::playback_poller::PlaybackPoller;
    use crate::services::status_publisher::{DEFAULT_STATUS_EMOJI, StatusPublisher};
    use crate::services::status_sync::StatusSync;
    use crate::services::token_refresher::TokenRefresher;
    use crate::spotify_rs::auth::SPOTIFY_AUTH_URL;
    use crate::test_utils::credential_store;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app_state(refresh_token: &str) -> Arc<AppState> {
        let credentials = credential_store(refresh_token, "", MockKeyValueStore::new());
        let auth_server = Arc::new(MockAuthorizationServer::new());
        let refresher = Arc::new(TokenRefresher::new(
            credentials.clone(),
            auth_server.clone(),
        ));
        let status_sync = Arc::new(StatusSync::new(
            PlaybackPoller::new(
                credentials.clone(),
                refresher.clone(),
                Arc::new(MockPlaybackApi::new()),
            ),
            StatusPublisher::new(
                Arc::new(MockStatusApi::new()),
                DEFAULT_STATUS_EMOJI.into(),
                None,
            ),
        ));

        Arc::new(AppState {
            credentials,
            auth_server,
            refresher,
            status_sync,
            authorize_url: SPOTIFY_AUTH_URL.to_string(),
        })
    }

    async fn body_of(app_state: Arc<AppState>, uri: &str) -> (StatusCode, String) {
        let response = router(app_state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_when_linked() {
        let (status, body) = body_of(app_state("rt"), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_root_when_not_linked() {
        let (status, body) = body_of(app_state(""), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/login"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, _) = body_of(app_state("rt"), "/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
