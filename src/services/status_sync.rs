use tracing::instrument;

use crate::ports::slack::StatusMessage;
use crate::services::playback_poller::{PlaybackPoller, PollError};
use crate::services::status_publisher::{PublishError, StatusPublisher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Published(StatusMessage),
    NothingPlaying,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// One poll → publish cycle, shared by the poll loop and the login callback.
pub struct StatusSync {
    poller: PlaybackPoller,
    publisher: StatusPublisher,
}

impl StatusSync {
    pub fn new(poller: PlaybackPoller, publisher: StatusPublisher) -> Self {
        Self { poller, publisher }
    }

    /// # Errors
    /// Returns the poll or publish failure of this cycle.
    #[instrument(skip(self))]
    pub async fn sync_once(&self) -> Result<SyncOutcome, SyncError> {
        match self.poller.poll().await? {
            Some(track) => {
                let status = self.publisher.publish(&track).await?;
                Ok(SyncOutcome::Published(status))
            }
            None => Ok(SyncOutcome::NothingPlaying),
        }
    }

    /// Run one cycle and log the outcome instead of returning it.
    pub async fn sync_and_log(&self) {
        match self.sync_once().await {
            Ok(SyncOutcome::Published(_)) => {}
            Ok(SyncOutcome::NothingPlaying) => {
                tracing::debug!("Nothing playing, Slack status left as is");
            }
            Err(SyncError::Poll(e)) if e.is_retryable() => {
                tracing::warn!(error = %e, "Status sync skipped this tick");
            }
            Err(e) => tracing::error!(error = %e, "Status sync failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::persistence::MockKeyValueStore;
    use crate::ports::slack::MockStatusApi;
    use crate::ports::spotify::{MockAuthorizationServer, MockPlaybackApi};
    use crate::services::status_publisher::DEFAULT_STATUS_EMOJI;
    use crate::services::token_refresher::TokenRefresher;
    use crate::slack_rs::SlackApiError;
    use crate::spotify_rs::auth::TokenEndpointError;
    use crate::spotify_rs::client::PlaybackApiError;
    use crate::test_utils::{credential_store, token_response, track};
    use tracing_test::traced_test;

    fn status_sync(playback: MockPlaybackApi, slack: MockStatusApi) -> StatusSync {
        let mut auth_server = MockAuthorizationServer::new();
        auth_server.expect_refresh().never();
        status_sync_with("at", auth_server, playback, slack)
    }

    fn status_sync_with(
        access_token: &str,
        auth_server: MockAuthorizationServer,
        playback: MockPlaybackApi,
        slack: MockStatusApi,
    ) -> StatusSync {
        let credentials = credential_store("rt", access_token, MockKeyValueStore::new());
        let refresher = Arc::new(TokenRefresher::new(
            credentials.clone(),
            Arc::new(auth_server),
        ));

        StatusSync::new(
            PlaybackPoller::new(credentials, refresher, Arc::new(playback)),
            StatusPublisher::new(Arc::new(slack), DEFAULT_STATUS_EMOJI.into(), None),
        )
    }

    /// Level of the first captured line containing `message`.
    fn level_of(lines: &[&str], message: &str) -> Result<&'static str, String> {
        let line = lines
            .iter()
            .find(|line| line.contains(message))
            .ok_or_else(|| format!("no log line contains {message:?}"))?;
        ["ERROR", "WARN", "INFO", "DEBUG", "TRACE"]
            .into_iter()
            .find(|level| line.contains(level))
            .ok_or_else(|| format!("no level in {line:?}"))
    }

    #[tokio::test]
    async fn test_sync_publishes_current_track() {
        let mut playback = MockPlaybackApi::new();
        playback
            .expect_currently_playing()
            .returning(|_| Ok(Some(track("Test Song", &["A", "B"]))));
        let mut slack = MockStatusApi::new();
        slack.expect_set_status().times(1).returning(|_| Ok(()));

        let outcome = status_sync(playback, slack).sync_once().await.unwrap();

        match outcome {
            SyncOutcome::Published(status) => {
                assert_eq!(status.status_text, "Listening to: Test Song by A, B");
            }
            SyncOutcome::NothingPlaying => panic!("expected a published status"),
        }
    }

    #[tokio::test]
    async fn test_nothing_playing_does_not_publish() {
        let mut playback = MockPlaybackApi::new();
        playback.expect_currently_playing().returning(|_| Ok(None));
        let mut slack = MockStatusApi::new();
        slack.expect_set_status().never();

        let outcome = status_sync(playback, slack).sync_once().await.unwrap();

        assert_eq!(outcome, SyncOutcome::NothingPlaying);
    }

    #[tokio::test]
    async fn test_publish_failure_is_reported() {
        let mut playback = MockPlaybackApi::new();
        playback
            .expect_currently_playing()
            .returning(|_| Ok(Some(track("Song", &["A"]))));
        let mut slack = MockStatusApi::new();
        slack
            .expect_set_status()
            .returning(|_| Err(SlackApiError::Rejected("not_authed".into())));

        let error = status_sync(playback, slack).sync_once().await.unwrap_err();

        assert!(matches!(error, SyncError::Publish(_)));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_nothing_playing_is_not_logged_as_a_problem() {
        let mut playback = MockPlaybackApi::new();
        playback.expect_currently_playing().returning(|_| Ok(None));
        let mut slack = MockStatusApi::new();
        slack.expect_set_status().never();

        status_sync(playback, slack).sync_and_log().await;

        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .find(|line| line.contains("ERROR") || line.contains("WARN"))
            {
                Some(line) => Err(format!("unexpected log line {line:?}")),
                None => Ok(()),
            }
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn test_rejected_access_token_is_logged_as_warning() {
        let mut auth_server = MockAuthorizationServer::new();
        auth_server
            .expect_refresh()
            .times(1)
            .returning(|_| Ok(token_response("at-new", None)));
        let mut playback = MockPlaybackApi::new();
        playback
            .expect_currently_playing()
            .returning(|_| Err(PlaybackApiError::Unauthorized));
        let mut slack = MockStatusApi::new();
        slack.expect_set_status().never();

        status_sync_with("at-stale", auth_server, playback, slack)
            .sync_and_log()
            .await;

        logs_assert(|lines: &[&str]| match level_of(lines, "Status sync skipped this tick")? {
            "WARN" => Ok(()),
            level => Err(format!("logged at {level}")),
        });
        assert!(!logs_contain("ERROR"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_playback_outage_is_logged_as_warning() {
        let mut playback = MockPlaybackApi::new();
        playback.expect_currently_playing().returning(|_| {
            Err(PlaybackApiError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: String::new(),
            })
        });
        let mut slack = MockStatusApi::new();
        slack.expect_set_status().never();

        status_sync(playback, slack).sync_and_log().await;

        logs_assert(|lines: &[&str]| match level_of(lines, "Status sync skipped this tick")? {
            "WARN" => Ok(()),
            level => Err(format!("logged at {level}")),
        });
        assert!(!logs_contain("ERROR"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_expired_refresh_token_is_logged_as_error() {
        let mut auth_server = MockAuthorizationServer::new();
        auth_server.expect_refresh().returning(|_| {
            Err(TokenEndpointError::InvalidGrant {
                description: "Refresh token revoked".into(),
            })
        });
        let mut playback = MockPlaybackApi::new();
        playback.expect_currently_playing().never();
        let mut slack = MockStatusApi::new();
        slack.expect_set_status().never();

        status_sync_with("", auth_server, playback, slack)
            .sync_and_log()
            .await;

        logs_assert(|lines: &[&str]| match level_of(lines, "Status sync failed")? {
            "ERROR" => Ok(()),
            level => Err(format!("logged at {level}")),
        });
    }
}
