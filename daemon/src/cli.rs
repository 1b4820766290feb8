//! Command-line interface definitions for linkwatch.
//!
//! Every option can also be provided through the environment, which is how
//! the service is normally configured.

use std::{env, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    config::{DEFAULT_ATTEMPTS, DEFAULT_INTERVAL_SECS, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_TARGET},
    telegram::DEFAULT_API_URL,
};

/// Top-level command-line interface definition.
#[derive(Debug, Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Output format of the log lines
    #[arg(long, global = true, value_enum, default_value_t, env = "LINKWATCH_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Arguments of `run`, used when no subcommand is given
    #[command(flatten)]
    pub run: RunArgs,
}

impl Cli {
    /// The selected subcommand, `run` when none was named.
    #[must_use]
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
    Pretty,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch the link and answer bot commands until terminated.
    Run(RunArgs),

    /// Probe every registered device once and print the result.
    Sweep(MonitorArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub bot: BotArgs,

    #[command(flatten)]
    pub monitor: MonitorArgs,
}

/// Telegram bot credentials and routing.
#[derive(Debug, Args)]
pub struct BotArgs {
    /// Bot API token
    #[arg(long, env = "TG_BOTADMIN_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Chat that receives link notifications (0 means unset)
    #[arg(long, env = "TG_CHAT_ID_BOTADMIN", default_value_t = 0, allow_negative_numbers = true)]
    pub chat_id: i64,

    /// Base URL of the Bot API
    #[arg(long, env = "LINKWATCH_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

/// What to watch and how often.
#[derive(Debug, Args)]
pub struct MonitorArgs {
    /// Address of the host whose link is watched
    #[arg(long, env = "LINKWATCH_TARGET", default_value = DEFAULT_TARGET)]
    pub target: String,

    /// Seconds between two probes of the target
    #[arg(long, env = "LINKWATCH_INTERVAL", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: u64,

    /// Consecutive equal probe results required to confirm a state change
    #[arg(long, env = "LINKWATCH_ATTEMPTS", default_value_t = DEFAULT_ATTEMPTS)]
    pub attempts: u32,

    /// Seconds a single probe may take
    #[arg(long, env = "LINKWATCH_PROBE_TIMEOUT", default_value_t = DEFAULT_PROBE_TIMEOUT_SECS)]
    pub probe_timeout: u64,

    /// TOML file listing the devices reported by `/ping`
    #[arg(long, env = "LINKWATCH_DEVICES")]
    pub devices: Option<PathBuf>,
}
