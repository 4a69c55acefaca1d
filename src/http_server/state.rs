use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::ports::spotify::AuthorizationServer;
use crate::services::status_sync::StatusSync;
use crate::services::token_refresher::TokenRefresher;

pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub auth_server: Arc<dyn AuthorizationServer>,
    pub refresher: Arc<TokenRefresher>,
    pub status_sync: Arc<StatusSync>,
    /// Spotify authorize endpoint, overridable for tests
    pub authorize_url: String,
}
