//! Turns CLI/environment input and the optional devices file into [`Settings`].

use core::time::Duration;
use std::path::Path;

use eyre::WrapErr as _;
use secrecy::SecretString;
use tokio::fs;
use tracing::{info, warn};

use crate::{
    cli::{BotArgs, MonitorArgs, RunArgs},
    config::{
        BotConfig, ConfigError, Device, DeviceRegistry, DevicesFile, ListenerConfig,
        MonitorConfig, Settings,
    },
    telegram::ChatId,
};

impl BotConfig {
    /// # Errors
    ///
    /// Returns an error if the token is missing or blank, or the chat id is unset.
    pub fn from_args(args: &BotArgs) -> Result<Self, ConfigError> {
        let token = args
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)?;
        let default_chat = ChatId::new(args.chat_id).ok_or(ConfigError::MissingChatId)?;
        Ok(Self {
            token: SecretString::from(token),
            default_chat,
            api_url: args.api_url.clone(),
        })
    }
}

impl MonitorConfig {
    /// # Errors
    ///
    /// Returns an error if the threshold, interval or probe timeout is zero.
    pub fn from_args(args: &MonitorArgs) -> Result<Self, ConfigError> {
        if args.attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if args.interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if args.probe_timeout == 0 {
            return Err(ConfigError::ZeroProbeTimeout);
        }
        Ok(Self {
            target: args.target.clone(),
            interval: Duration::from_secs(args.interval),
            attempts: args.attempts,
            probe_timeout: Duration::from_secs(args.probe_timeout),
        })
    }
}

/// Reads and parses a devices file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub(crate) async fn load_devices<P: AsRef<Path>>(path: P) -> eyre::Result<Vec<Device>> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref).await.wrap_err(format!(
        "Failed to read devices file at: {}",
        path_ref.display()
    ))?;
    let file: DevicesFile = toml::from_str(&content).wrap_err(format!(
        "Failed to parse devices file as TOML at: {}",
        path_ref.display()
    ))?;
    Ok(file.devices)
}

/// Builds the registry from `path`, or from the target alone when no file is given.
///
/// # Errors
///
/// Returns an error if the devices file cannot be loaded.
pub async fn load_registry(path: Option<&Path>, target: &str) -> eyre::Result<DeviceRegistry> {
    let Some(path) = path else {
        return Ok(DeviceRegistry::single(target));
    };
    let devices = load_devices(path).await?;
    if devices.is_empty() {
        warn!("Devices file {} lists no devices, /ping will only print a header", path.display());
    }
    info!("Loaded {} devices from {}", devices.len(), path.display());
    Ok(DeviceRegistry::new(devices))
}

/// Validates the `run` arguments.
///
/// # Errors
///
/// Returns an error if a required option is missing or invalid, or the devices file cannot be loaded.
pub async fn resolve(args: &RunArgs) -> eyre::Result<Settings> {
    let bot = BotConfig::from_args(&args.bot)?;
    let monitor = MonitorConfig::from_args(&args.monitor)?;
    let listener = ListenerConfig::default().validate()?;
    let devices = load_registry(args.monitor.devices.as_deref(), &monitor.target).await?;
    Ok(Settings {
        bot,
        monitor,
        listener,
        devices,
    })
}
