use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::services::background::{DEFAULT_POLL_INTERVAL, DEFAULT_REFRESH_INTERVAL, Schedule};
use crate::services::status_publisher::DEFAULT_STATUS_EMOJI;

const APP_DIR: &str = "spotify-slack-status";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the refresh token is persisted between runs
    #[serde(skip_serializing_if = "Option::is_none")]
    state_file: Option<PathBuf>,
    #[serde(with = "humantime_duration")]
    poll_interval: Duration,
    #[serde(with = "humantime_duration")]
    refresh_interval: Duration,
    #[serde(with = "humantime_duration")]
    request_timeout: Duration,
    status_emoji: String,
    /// Let Slack clear the status on its own if the bridge stops updating it
    #[serde(
        with = "humantime_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    status_expiration: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            request_timeout: Duration::from_secs(10),
            status_emoji: DEFAULT_STATUS_EMOJI.to_string(),
            status_expiration: None,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        if config.poll_interval.is_zero() || config.refresh_interval.is_zero() {
            return Err(eyre!("poll_interval and refresh_interval must be greater than zero"));
        }
        Ok(config)
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join(APP_DIR).join("config.toml"))
    }

    /// Load the default config file, falling back to defaults when it does not exist
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Write the default config to the default path, if it doesn't exist
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_else(|| eyre!("No config directory found"))?;
        if path.exists() {
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents =
            toml::to_string_pretty(&Self::default()).wrap_err("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(path)
    }

    /// Get the state file path, defaulting to the user data directory
    pub fn state_file_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.state_file {
            return Ok(expand_path(path));
        }
        dirs::data_dir()
            .map(|path| path.join(APP_DIR).join("state.toml"))
            .ok_or_else(|| eyre!("No data directory found, set state_file in the config"))
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            poll_interval: self.poll_interval,
            refresh_interval: self.refresh_interval,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn status_emoji(&self) -> &str {
        &self.status_emoji
    }

    pub fn status_expiration(&self) -> Option<Duration> {
        self.status_expiration
    }
}

/// Expand ~ to home directory
fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

mod humantime_duration {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = String::deserialize(deserializer)?;
        humantime::parse_duration(&value).map_err(serde::de::Error::custom)
    }
}

mod humantime_duration_opt {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(duration) => super::humantime_duration::serialize(duration, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|value| humantime::parse_duration(&value).map_err(serde::de::Error::custom))
            .transpose()
    }
}
