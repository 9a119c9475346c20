// ── Engine tuning configuration ──
//
// Cycle cadence and retry pacing for one bridge instance. Built by the
// daemon (or embedder) and handed in; the engine never reads files.

use std::time::Duration;

use serde::Deserialize;

/// Timing knobs of the synchronization engine.
///
/// The defaults are the cadence the controller is known to tolerate; they
/// rarely need touching outside tests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Upper bound on one blocking wait for value notifications.
    pub notification_timeout_secs: u64,
    /// Pacing sleep at the end of every worker cycle.
    pub pacing_secs: u64,
    /// Cooldown after disconnecting because no device is watched.
    pub idle_cooldown_secs: u64,
    /// Disconnected cycles between consecutive open attempts.
    pub open_retry_cycles: u32,
    /// Cycles between battery/signal maintenance sweeps.
    pub maintenance_interval_cycles: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            notification_timeout_secs: 20,
            pacing_secs: 1,
            idle_cooldown_secs: 10,
            open_retry_cycles: 30,
            maintenance_interval_cycles: 100,
        }
    }
}

impl BridgeConfig {
    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification_timeout_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_secs)
    }

    pub fn idle_cooldown(&self) -> Duration {
        Duration::from_secs(self.idle_cooldown_secs)
    }
}
