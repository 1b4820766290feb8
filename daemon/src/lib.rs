//! Library entry for the `linkwatch` daemon.
//!
//! Exposes `inner_main` so the workspace-level binary can call into the daemon logic.
//!
//! Two loops run side by side: the link monitor, which pings the watched host and reports
//! confirmed up/down transitions, and the command listener, which answers bot commands.
#![cfg_attr(
    test,
    expect(clippy::indexing_slicing, reason = "This is not problematic in tests",)
)]

extern crate alloc;
extern crate core;

pub mod app;
pub mod cli;
pub mod config;
pub mod telegram;

use std::{env, io, process, sync::Once};

use eyre::Result;
use linkwatch_common::PingProber;
use tracing::{Instrument as _, debug, info};
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use cli::{Cli, Command, LogFormat};
use config::{MonitorConfig, load_registry, resolve};

static INIT_TRACING: Once = Once::new();
static INIT_RUSTLS: Once = Once::new();

/// Installs the process-wide TLS crypto provider used by `reqwest`.
pub(crate) fn init_rustls() {
    INIT_RUSTLS.call_once(|| {
        if rustls_openssl::default_provider().install_default().is_err() {
            debug!("A rustls crypto provider was already installed");
        }
    });
}

fn init_tracing(log_format: LogFormat) {
    INIT_TRACING.call_once(move || {
        let default_level = if env::var("LINKWATCH_INTEGRATION_TEST").is_ok() {
            "error"
        } else {
            "info"
        };

        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with_timer(ChronoLocal::rfc_3339())
            // stdout carries command output
            .with_writer(io::stderr);

        match log_format {
            LogFormat::Compact => builder.compact().init(),
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.pretty().init(),
        }
    });
}

/// The daemon's main function; can be called from a shim binary.
///
/// Dispatches to the long-running service (the default) or a one-off sweep.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a background loop fails.
pub async fn inner_main(invocation: Cli) -> Result<()> {
    init_tracing(invocation.log_format);

    match invocation.into_command() {
        Command::Run(args) => {
            let settings = resolve(&args).await?;

            let startup_span = tracing::info_span!(
                "linkwatch",
                host = %settings.monitor.target,
                pid = ?process::id(),
                version = env!("CARGO_PKG_VERSION")
            );
            init_rustls();

            async {
                info!("Starting linkwatch");
                app::start(settings).await
            }
            .instrument(startup_span)
            .await
        }
        Command::Sweep(args) => {
            let monitor = MonitorConfig::from_args(&args)?;
            let devices = load_registry(args.devices.as_deref(), &monitor.target).await?;
            let prober = PingProber::new(monitor.probe_timeout);
            for (device, reachable) in app::sweep(&prober, &devices).await {
                println!("{}", app::device_line(device, reachable));
            }
            Ok(())
        }
    }
}
