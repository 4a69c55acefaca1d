use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ports::slack::{StatusApi, StatusMessage};

pub const SLACK_API_URL: &str = "https://slack.com/api";

#[derive(Debug, thiserror::Error)]
pub enum SlackApiError {
    /// Slack answered `ok: false`, e.g. `invalid_auth` or `missing_scope`
    #[error("Slack rejected the request: {0}")]
    Rejected(String),
    #[error("Unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

#[derive(Debug, Serialize)]
struct ProfileSetRequest<'a> {
    profile: Profile<'a>,
}

#[derive(Debug, Serialize)]
struct Profile<'a> {
    status_text: &'a str,
    status_emoji: &'a str,
    status_expiration: i64,
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
}

/// Slack Web API client, limited to `users.profile.set`
pub struct SlackClient {
    client: reqwest::Client,
    token: String,
    api_url: String,
    timeout: Duration,
}

impl SlackClient {
    pub fn new(token: String, timeout: Duration) -> Self {
        Self::with_api_url(token, SLACK_API_URL, timeout)
    }

    pub fn with_api_url(token: String, api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            api_url: api_url.into(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl StatusApi for SlackClient {
    async fn set_status(&self, status: &StatusMessage) -> Result<(), SlackApiError> {
        let request = ProfileSetRequest {
            profile: Profile {
                status_text: &status.status_text,
                status_emoji: &status.status_emoji,
                status_expiration: status.status_expiration,
            },
        };

        let response = self
            .client
            .post(format!("{}/users.profile.set", self.api_url))
            .bearer_auth(&self.token)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(SlackApiError::FailedToSendRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackApiError::Status { status, body });
        }

        let body: SlackResponse = response
            .json()
            .await
            .map_err(SlackApiError::FailedToParseResponse)?;
        if !body.ok {
            return Err(SlackApiError::Rejected(
                body.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        Ok(())
    }
}
