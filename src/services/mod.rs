pub mod background;
pub mod playback_poller;
pub mod status_publisher;
pub mod status_sync;
pub mod token_refresher;
