use alloc::sync::Arc;

use eyre::WrapErr as _;
use linkwatch_common::PingProber;
use tokio::{signal, sync::watch, task::JoinSet};
use tracing::{Instrument as _, error, info};

use super::{commands::CommandListener, link::run_link_monitor};
use crate::{config::Settings, telegram::TelegramClient};

/// Creates a future that resolves when a shutdown signal is received.
pub(crate) async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!("Failed to install SIGTERM handler, only Ctrl-C will stop: {e}");
                drop(signal::ctrl_c().await);
                return;
            }
        };
        tokio::select! {
            _ = sigterm.recv() => {}
            res = signal::ctrl_c() => drop(res),
        }
    }
    #[cfg(not(unix))]
    {
        drop(signal::ctrl_c().await);
    }
}

/// Starts the link monitor and the command listener and runs them until
/// a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the bot client cannot be built, or if either loop
/// ends before shutdown was requested.
pub(crate) async fn start(settings: Settings) -> eyre::Result<()> {
    let Settings {
        bot,
        monitor,
        listener,
        devices,
    } = settings;

    let client = Arc::new(
        TelegramClient::new(&bot.api_url, Some(bot.token), Some(bot.default_chat))
            .wrap_err("Failed to set up the Telegram client")?,
    );
    let prober = Arc::new(PingProber::new(monitor.probe_timeout));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut tasks = JoinSet::new();
    tasks.spawn(
        run_link_monitor(monitor, prober.clone(), client.clone(), shutdown_rx.clone())
            .in_current_span(),
    );
    tasks.spawn(
        CommandListener::new(client.clone(), prober, client, devices, listener)
            .run(shutdown_rx)
            .in_current_span(),
    );

    let ended_early = tokio::select! {
        () = shutdown_signal() => {
            info!("Received shutdown, stopping");
            false
        }
        Some(res) = tasks.join_next() => {
            error!("A background loop exited on its own, stopping");
            res.wrap_err("Background loop failed")?;
            true
        }
    };

    shutdown_tx.send_replace(true);
    while let Some(res) = tasks.join_next().await {
        res.wrap_err("Background loop failed")?;
    }

    if ended_early {
        eyre::bail!("A background loop exited unexpectedly");
    }
    info!("Stopped");
    Ok(())
}
