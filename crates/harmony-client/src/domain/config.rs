//! Client configuration with validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default addressee and payload namespace of hub commands.
pub const DEFAULT_RECIPIENT: &str = "connect.logitech.com";
/// Mime prefix every hub command is appended to after a `?`.
pub const DEFAULT_COMMAND_NAMESPACE: &str = "vnd.logitech.harmony/vnd.logitech.harmony.engine";

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// `to` attribute of outbound stanzas
    pub recipient: String,
    /// `xmlns` attribute of the `oa` payload element
    pub xmlns: String,
    /// Prefix of the `mime` attribute
    pub command_namespace: String,
    /// Per-request timeout. `None` keeps requests pending until matched or closed.
    pub request_timeout_ms: Option<u64>,
    /// Interval of the expired-request sweep
    pub cleanup_interval_ms: u64,
    /// Capacity of the notification broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            recipient: DEFAULT_RECIPIENT.to_string(),
            xmlns: DEFAULT_RECIPIENT.to_string(),
            command_namespace: DEFAULT_COMMAND_NAMESPACE.to_string(),
            request_timeout_ms: None,
            cleanup_interval_ms: 1000,
            event_channel_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl HubConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recipient.trim().is_empty() {
            return Err(ConfigError::EmptyField("recipient"));
        }
        if self.xmlns.trim().is_empty() {
            return Err(ConfigError::EmptyField("xmlns"));
        }
        if self.command_namespace.trim().is_empty() {
            return Err(ConfigError::EmptyField("command_namespace"));
        }

        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout_ms cannot be 0".into(),
            ));
        }
        if self.cleanup_interval_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "cleanup_interval_ms cannot be 0".into(),
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err(ConfigError::InvalidCapacity(
                "event_channel_capacity cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `HARMONY_RECIPIENT`: recipient and payload namespace
    /// - `HARMONY_REQUEST_TIMEOUT_MS`: per-request timeout (unset = none)
    /// - `HARMONY_CLEANUP_INTERVAL_MS`: sweep interval (default: 1000)
    /// - `HARMONY_EVENT_CAPACITY`: broadcast capacity (default: 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(recipient) = lookup("HARMONY_RECIPIENT") {
            config.xmlns.clone_from(&recipient);
            config.recipient = recipient;
        }
        if let Some(raw) = lookup("HARMONY_REQUEST_TIMEOUT_MS") {
            config.request_timeout_ms = Some(parse_var("HARMONY_REQUEST_TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = lookup("HARMONY_CLEANUP_INTERVAL_MS") {
            config.cleanup_interval_ms = parse_var("HARMONY_CLEANUP_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("HARMONY_EVENT_CAPACITY") {
            config.event_channel_capacity = parse_var("HARMONY_EVENT_CAPACITY", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Configured per-request timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Interval of the expired-request sweep.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
        key,
        value: raw.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Required string field is empty
    #[error("`{0}` cannot be empty")]
    EmptyField(&'static str),
    /// Invalid timeout or interval
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Invalid channel capacity
    #[error("invalid capacity: {0}")]
    InvalidCapacity(String),
    /// Environment variable could not be parsed
    #[error("invalid value `{value}` for {key}")]
    InvalidVar { key: &'static str, value: String },
}
