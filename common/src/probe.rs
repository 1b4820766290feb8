//! Reachability checks against a single host.
//!
//! A probe never fails: spawn errors, non-zero exit codes and timeouts all
//! collapse to "unreachable".

use core::{future::Future, time::Duration};
use std::process::Stdio;

use tokio::{process::Command, time::timeout};
use tracing::{debug, warn};

/// Default upper bound for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Extra time granted on top of the probe timeout before the child is killed.
///
/// `ping` enforces `-W` itself, this only guards against a stuck process.
const KILL_GRACE: Duration = Duration::from_secs(1);

/// A single reachability check, `true` if the host answered in time.
pub trait Prober: Send + Sync {
    fn probe(&self, address: &str) -> impl Future<Output = bool> + Send;
}

/// Probes hosts by sending one ICMP echo request through the system `ping`.
#[derive(Debug, Clone)]
pub struct PingProber {
    program: String,
    timeout: Duration,
}

impl PingProber {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("ping", timeout)
    }

    /// Uses `program` instead of `ping` from `PATH`. It must accept the iputils argument style.
    #[must_use]
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for PingProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl Prober for PingProber {
    async fn probe(&self, address: &str) -> bool {
        // -W takes whole seconds, anything below one would mean "wait forever" on some platforms
        let wait_secs = self.timeout.as_secs().max(1).to_string();

        let spawned = Command::new(&self.program)
            .args(["-c", "1", "-W", wait_secs.as_str(), address])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to run {} for {}: {}", self.program, address, e);
                return false;
            }
        };

        let reachable = match timeout(self.timeout + KILL_GRACE, child.wait()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                warn!("Failed to wait for {} on {}: {}", self.program, address, e);
                false
            }
            Err(_) => {
                debug!("Probe of {} timed out", address);
                false
            }
        };
        debug!("Probed {} - reachable: {}", address, reachable);
        reachable
    }
}
