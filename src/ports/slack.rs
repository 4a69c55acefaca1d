use crate::slack_rs::SlackApiError;

/// Profile status as sent to Slack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub status_text: String,
    pub status_emoji: String,
    /// Unix timestamp after which Slack clears the status, `0` for never.
    pub status_expiration: i64,
}

/// Port trait wrapping the Slack profile API.
///
/// Implementations live in `slack_rs` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StatusApi: Send + Sync {
    async fn set_status(&self, status: &StatusMessage) -> Result<(), SlackApiError>;
}
