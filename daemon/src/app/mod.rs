mod commands;
mod link;
mod startup;
#[cfg(test)]
mod testing;

use tokio::sync::watch;

pub use commands::{BotCommand, CommandListener, device_line, render_sweep, sweep};
pub use link::{ConnectivityState, LinkMonitor, ProbeOutcome, Transition, render_transition};
pub(crate) use startup::start;

/// Flips to `true` once to ask both loops to stop.
pub(crate) type ShutdownRx = watch::Receiver<bool>;

/// Resolves once shutdown was requested, or once the sender is gone.
pub(crate) async fn wait_for_shutdown(shutdown: &mut ShutdownRx) {
    drop(shutdown.wait_for(|&stop| stop).await);
}
