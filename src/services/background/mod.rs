use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::services::status_sync::StatusSync;
use crate::services::token_refresher::TokenRefresher;

/// Spotify access tokens live for an hour; refresh a little before that
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3500);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub poll_interval: Duration,
    pub refresh_interval: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// Handle to the token refresh loop and the status poll loop.
pub struct BackgroundTasks {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn start(
        refresher: Arc<TokenRefresher>,
        status_sync: Arc<StatusSync>,
        schedule: Schedule,
    ) -> Self {
        let cancel = CancellationToken::new();

        // Proactive refresh, first run one interval from now
        let refresh_cancel = cancel.clone();
        let refresh_handle = tokio::spawn(async move {
            tracing::info!(interval = ?schedule.refresh_interval, "Token refresh loop started");
            let period = schedule.refresh_interval;
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = refresh_cancel.cancelled() => break,
                    _ = interval.tick() => {
                        // Failures are logged by the refresher and never end the loop
                        let _ = refresher.refresh().await;
                    }
                }
            }
            tracing::info!("Token refresh loop stopped");
        });

        // Status poll, first run right away
        let poll_cancel = cancel.clone();
        let poll_handle = tokio::spawn(async move {
            tracing::info!(interval = ?schedule.poll_interval, "Status poll loop started");
            let mut interval = tokio::time::interval(schedule.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = poll_cancel.cancelled() => break,
                    _ = interval.tick() => status_sync.sync_and_log().await,
                }
            }
            tracing::info!("Status poll loop stopped");
        });

        Self {
            cancel,
            handles: vec![refresh_handle, poll_handle],
        }
    }

    /// Stop both loops and wait for them to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Background task panicked");
            }
        }
    }
}
