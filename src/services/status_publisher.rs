use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::instrument;

use crate::ports::slack::{StatusApi, StatusMessage};
use crate::ports::spotify::TrackSnapshot;
use crate::slack_rs::SlackApiError;

pub const DEFAULT_STATUS_EMOJI: &str = ":headphones:";

/// Slack rejects status texts longer than this many characters
const MAX_STATUS_TEXT_CHARS: usize = 100;
const ELLIPSIS: &str = "...";

#[derive(Debug, thiserror::Error)]
#[error("Failed to update Slack status: {0}")]
pub struct PublishError(#[from] pub SlackApiError);

/// Format a track as `Listening to: {track} by {artist, artist, ...}`.
/// The `by` part is left out when the track has no artists.
pub fn format_status_text(snapshot: &TrackSnapshot) -> String {
    let text = if snapshot.artist_names.is_empty() {
        format!("Listening to: {}", snapshot.track_name)
    } else {
        format!(
            "Listening to: {} by {}",
            snapshot.track_name,
            snapshot.artist_names.join(", ")
        )
    };
    truncate_status_text(text)
}

fn truncate_status_text(text: String) -> String {
    if text.chars().count() <= MAX_STATUS_TEXT_CHARS {
        return text;
    }

    let keep = MAX_STATUS_TEXT_CHARS - ELLIPSIS.len();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

pub struct StatusPublisher {
    slack: Arc<dyn StatusApi>,
    emoji: String,
    expiration: Option<Duration>,
}

impl StatusPublisher {
    pub fn new(slack: Arc<dyn StatusApi>, emoji: String, expiration: Option<Duration>) -> Self {
        Self {
            slack,
            emoji,
            expiration,
        }
    }

    pub fn status_for(&self, snapshot: &TrackSnapshot) -> StatusMessage {
        let status_expiration = self
            .expiration
            .and_then(|expiration| chrono::Duration::from_std(expiration).ok())
            .map_or(0, |expiration| (Utc::now() + expiration).timestamp());

        StatusMessage {
            status_text: format_status_text(snapshot),
            status_emoji: self.emoji.clone(),
            status_expiration,
        }
    }

    /// Push the track to the Slack profile status. Not retried on failure.
    ///
    /// # Errors
    /// Returns [`PublishError`] when Slack cannot be reached or rejects the update.
    #[instrument(skip(self, snapshot), fields(track = %snapshot.track_name))]
    pub async fn publish(&self, snapshot: &TrackSnapshot) -> Result<StatusMessage, PublishError> {
        let status = self.status_for(snapshot);
        self.slack.set_status(&status).await?;
        tracing::info!(status_text = %status.status_text, "Updated Slack status");
        Ok(status)
    }
}
