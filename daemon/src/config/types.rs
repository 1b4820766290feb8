//! Resolved configuration for the two loops.
//!
//! Values arrive through the CLI/environment (see [`crate::cli`]) and are
//! validated into these types once at startup.

use alloc::sync::Arc;
use core::{slice, time::Duration};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error as ThisError;

use crate::telegram::ChatId;

pub const DEFAULT_TARGET: &str = "10.0.0.2";
pub const DEFAULT_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_ATTEMPTS: u32 = 2;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 3;

/// Label used for the target when no devices file is configured.
pub const DEFAULT_TARGET_LABEL: &str = "Гараж";

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Bot token is missing, set TG_BOTADMIN_TOKEN or pass --bot-token")]
    MissingToken,
    #[error("Notification chat is missing, set TG_CHAT_ID_BOTADMIN or pass --chat-id (0 counts as unset)")]
    MissingChatId,
    #[error("The confirmation threshold must be at least 1")]
    ZeroAttempts,
    #[error("The poll interval must be at least one second")]
    ZeroInterval,
    #[error("The probe timeout must be at least one second")]
    ZeroProbeTimeout,
    #[error("The command poll timeout ({timeout:?}) must exceed the long-poll wait ({wait:?})")]
    PollTimeoutTooShort { wait: Duration, timeout: Duration },
}

/// Bot credentials and the default notification target.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: SecretString,
    pub default_chat: ChatId,
    pub api_url: String,
}

/// Settings of the link monitor loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub target: String,
    pub interval: Duration,
    pub attempts: u32,
    pub probe_timeout: Duration,
}

/// Settings of the command listener loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerConfig {
    /// How long the Bot API may hold a `getUpdates` call open.
    pub poll_wait: Duration,
    /// Upper bound of one `getUpdates` call, strictly larger than `poll_wait`.
    pub poll_timeout: Duration,
    /// Pause after a failed poll before retrying with the same cursor.
    pub backoff: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            poll_wait: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(35),
            backoff: Duration::from_secs(5),
        }
    }
}

impl ListenerConfig {
    /// # Errors
    ///
    /// Returns an error if `poll_timeout` does not exceed `poll_wait`.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.poll_timeout <= self.poll_wait {
            return Err(ConfigError::PollTimeoutTooShort {
                wait: self.poll_wait,
                timeout: self.poll_timeout,
            });
        }
        Ok(self)
    }
}

/// A device reported by the `/ping` sweep.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Device {
    pub address: String,
    pub label: String,
}

/// Ordered, immutable list of devices, shared read-only between tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRegistry(Arc<[Device]>);

impl DeviceRegistry {
    #[must_use]
    pub fn new(devices: Vec<Device>) -> Self {
        Self(devices.into())
    }

    /// Registry holding only the watched target.
    #[must_use]
    pub fn single(address: &str) -> Self {
        Self::new(vec![Device {
            address: address.to_owned(),
            label: DEFAULT_TARGET_LABEL.to_owned(),
        }])
    }

    pub fn iter(&self) -> slice::Iter<'_, Device> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'reg> IntoIterator for &'reg DeviceRegistry {
    type Item = &'reg Device;
    type IntoIter = slice::Iter<'reg, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// On-disk layout of the devices file.
#[derive(Debug, Deserialize)]
pub(crate) struct DevicesFile {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Everything `run` needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bot: BotConfig,
    pub monitor: MonitorConfig,
    pub listener: ListenerConfig,
    pub devices: DeviceRegistry,
}
