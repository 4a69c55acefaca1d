use std::sync::Arc;

use axum::extract::State;

use crate::http_server::state::AppState;

/// Liveness check; also tells whether a Spotify account is linked.
pub async fn root(State(app_state): State<Arc<AppState>>) -> String {
    let credentials = app_state.credentials.get().await;
    if credentials.refresh_token.is_empty() {
        "ok (Spotify not linked, visit /login)".to_string()
    } else {
        "ok".to_string()
    }
}
