//! Debounced link state of the watched host.
//!
//! Raw probe results are noisy: a single lost echo must not page the operator.
//! [`LinkMonitor`] only reports a state change after `attempts` consecutive
//! probes agree, and measures how long the previous state lasted.
//!
//! ```text
//!            attempts x Failure
//!   Online ─────────────────────► Offline
//!     ▲                              │
//!     └──────────────────────────────┘
//!            attempts x Success
//! ```

use alloc::sync::Arc;
use core::time::Duration;

use chrono::{DateTime, Local};
use linkwatch_common::{Prober, format_elapsed};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use super::{ShutdownRx, wait_for_shutdown};
use crate::{config::MonitorConfig, telegram::Notifier};

/// Confirmed state of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Online,
    Offline,
}

/// Result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    Failure,
}

impl From<bool> for ProbeOutcome {
    fn from(reachable: bool) -> Self {
        if reachable {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

/// A confirmed state change, carrying how long the previous state lasted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    LinkDown { uptime: Duration },
    LinkUp { downtime: Duration },
}

/// Hysteresis over consecutive probe outcomes.
///
/// At most one of the two streaks is non-zero. The streak that confirmed a
/// transition is not reset, it keeps growing without effect until an
/// opposite outcome arrives.
#[derive(Debug, Clone)]
pub struct LinkMonitor {
    attempts: u32,
    state: ConnectivityState,
    success_streak: u32,
    fail_streak: u32,
    last_change: Instant,
}

impl LinkMonitor {
    /// Starts `Online`, with `started` as the beginning of the first uptime.
    #[must_use]
    pub const fn new(attempts: u32, started: Instant) -> Self {
        Self {
            attempts,
            state: ConnectivityState::Online,
            success_streak: 0,
            fail_streak: 0,
            last_change: started,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ConnectivityState {
        self.state
    }

    /// `(success_streak, fail_streak)`
    #[must_use]
    pub const fn streaks(&self) -> (u32, u32) {
        (self.success_streak, self.fail_streak)
    }

    /// Feeds one probe outcome observed at `now`.
    ///
    /// Returns the transition if this outcome confirmed one.
    pub fn observe(&mut self, outcome: ProbeOutcome, now: Instant) -> Option<Transition> {
        match outcome {
            ProbeOutcome::Success => {
                self.success_streak = self.success_streak.saturating_add(1);
                self.fail_streak = 0;
            }
            ProbeOutcome::Failure => {
                self.fail_streak = self.fail_streak.saturating_add(1);
                self.success_streak = 0;
            }
        }

        let transition = match self.state {
            ConnectivityState::Online if self.fail_streak >= self.attempts => {
                self.state = ConnectivityState::Offline;
                Transition::LinkDown {
                    uptime: now.saturating_duration_since(self.last_change),
                }
            }
            ConnectivityState::Offline if self.success_streak >= self.attempts => {
                self.state = ConnectivityState::Online;
                Transition::LinkUp {
                    downtime: now.saturating_duration_since(self.last_change),
                }
            }
            _ => return None,
        };
        self.last_change = now;
        Some(transition)
    }
}

/// Operator message for `transition`, confirmed at wall-clock time `at`.
#[must_use]
pub fn render_transition(transition: Transition, at: DateTime<Local>) -> String {
    let timestamp = at.format("%d.%m.%Y %H:%M:%S");
    match transition {
        Transition::LinkDown { uptime } => format!(
            "⚠️ <b>Связь с гаражом пропала</b>\nВремя обрыва: {timestamp}\nАптайм: {}",
            format_elapsed(uptime)
        ),
        Transition::LinkUp { downtime } => format!(
            "✅ <b>Связь с гаражом восстановлена</b>\nВремя восстановления: {timestamp}\nДаунтайм: {}",
            format_elapsed(downtime)
        ),
    }
}

/// Background task: probes the target once per interval and notifies the
/// default chat about every confirmed transition.
///
/// Runs until `shutdown` fires. Probing and sleeping are the only suspension
/// points and both observe the shutdown signal.
#[tracing::instrument(skip_all, fields(host = %config.target))]
pub(crate) async fn run_link_monitor<P, N>(
    config: MonitorConfig,
    prober: Arc<P>,
    notifier: Arc<N>,
    mut shutdown: ShutdownRx,
) where
    P: Prober,
    N: Notifier,
{
    let mut monitor = LinkMonitor::new(config.attempts, Instant::now());
    info!(
        "Watching link every {:?}, {} attempts to confirm",
        config.interval, config.attempts
    );

    loop {
        let outcome = tokio::select! {
            reachable = prober.probe(&config.target) => ProbeOutcome::from(reachable),
            () = wait_for_shutdown(&mut shutdown) => break,
        };

        let transition = monitor.observe(outcome, Instant::now());
        let (success_streak, fail_streak) = monitor.streaks();
        debug!(
            ?outcome,
            success_streak,
            fail_streak,
            state = ?monitor.state(),
            "Probe finished"
        );

        if let Some(transition) = transition {
            match transition {
                Transition::LinkDown { uptime } => {
                    info!("Link lost after {:?} of uptime, notifying", uptime);
                }
                Transition::LinkUp { downtime } => {
                    info!("Link restored after {:?} of downtime, notifying", downtime);
                }
            }
            notifier
                .notify(&render_transition(transition, Local::now()), None)
                .await;
        }

        tokio::select! {
            () = sleep(config.interval) => {}
            () = wait_for_shutdown(&mut shutdown) => break,
        }
    }

    info!("Link monitor stopped");
}
