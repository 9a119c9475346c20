//! Deterministic controller-session simulator.
//!
//! Stands in for the SOAP transport so the daemon can run end-to-end
//! without an IHC controller on the network: watched resources toggle on a
//! fixed cadence and the wireless report covers every configured serial.
//! Everything is derived from a tick counter -- two runs over the same
//! configuration produce the same stream.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use ihcd_core::{
    ControllerSession, DeviceId, ResourceValue, RfDevice, RfReport, SerialNumber, SessionError,
};

use crate::config::SimulatorConfig;

#[derive(Debug, Default)]
struct SimState {
    connected: bool,
    watched: Vec<DeviceId>,
    tick: u64,
}

/// Simulated session over a fixed set of wireless serials.
#[derive(Debug)]
pub struct SimSession {
    notify_interval: Duration,
    serials: Vec<SerialNumber>,
    state: Mutex<SimState>,
}

impl SimSession {
    pub fn new(config: &SimulatorConfig, serials: Vec<SerialNumber>) -> Self {
        Self {
            notify_interval: Duration::from_secs(config.notify_interval_secs.max(1)),
            serials,
            state: Mutex::new(SimState::default()),
        }
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, SimState>, SessionError> {
        self.state.lock().map_err(|_| SessionError::Transport {
            reason: "simulator state poisoned".to_owned(),
        })
    }
}

#[async_trait]
impl ControllerSession for SimSession {
    async fn open(&self) -> Result<(), SessionError> {
        self.locked()?.connected = true;
        debug!("simulator session open");
        Ok(())
    }

    async fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.connected = false;
            state.watched.clear();
        }
    }

    async fn logout(&self) -> Result<(), SessionError> {
        self.locked()?.connected = false;
        Ok(())
    }

    async fn enable_runtime_notifications(&self, ids: &[DeviceId]) -> Result<(), SessionError> {
        let mut state = self.locked()?;
        if !state.connected {
            return Err(SessionError::Transport {
                reason: "no session".to_owned(),
            });
        }
        state.watched = ids.to_vec();
        Ok(())
    }

    async fn wait_resource_notifications(
        &self,
        timeout: Duration,
    ) -> Result<Vec<ResourceValue>, SessionError> {
        let selected = {
            let mut state = self.locked()?;
            if !state.connected {
                return Err(SessionError::Transport {
                    reason: "no session".to_owned(),
                });
            }
            if state.watched.is_empty() {
                None
            } else {
                state.tick = state.tick.wrapping_add(1);
                let index = usize::try_from(state.tick).unwrap_or(usize::MAX) % state.watched.len();
                Some((state.watched[index], state.tick))
            }
        };
        let (id, tick) = match selected {
            Some(pair) => pair,
            None => {
                tokio::time::sleep(timeout).await;
                return Ok(Vec::new());
            }
        };

        tokio::time::sleep(self.notify_interval.min(timeout)).await;

        // Alternate between a level change and an off, cycling the level
        // through 2..=99 so it always lands in set-level territory.
        let value = if tick % 2 == 0 {
            ResourceValue::level(id, i32::try_from(2 + (tick * 7) % 98).unwrap_or(2))
        } else {
            ResourceValue::binary(id, false)
        };
        Ok(vec![value])
    }

    async fn resource_update(&self, value: &ResourceValue) -> Result<bool, SessionError> {
        let state = self.locked()?;
        if !state.connected {
            return Err(SessionError::Transport {
                reason: "no session".to_owned(),
            });
        }
        debug!(resource = %value.id, state = ?value.state, "simulator accepted update");
        Ok(true)
    }

    async fn detected_rf_devices(&self) -> Result<RfReport, SessionError> {
        let state = self.locked()?;
        if !state.connected {
            return Err(SessionError::Transport {
                reason: "no session".to_owned(),
            });
        }
        let devices = self
            .serials
            .iter()
            .enumerate()
            .map(|(index, serial)| RfDevice {
                serial: *serial,
                // Every third unit reports a low battery.
                battery_indicator: if index % 3 == 2 { 0 } else { 1 },
                signal_strength: 40 + u8::try_from(index % 5).unwrap_or(0) * 4,
            })
            .collect();
        Ok(RfReport { devices })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session() -> SimSession {
        SimSession::new(
            &SimulatorConfig {
                notify_interval_secs: 1,
            },
            vec![SerialNumber::new(900), SerialNumber::new(901)],
        )
    }

    #[tokio::test(start_paused = true)]
    async fn disconnected_calls_fail() {
        let sim = session();
        let result = sim.wait_resource_notifications(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(SessionError::Transport { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn notifications_cover_all_watched_resources() {
        let sim = session();
        sim.open().await.unwrap();
        let ids = [DeviceId::new(0x10), DeviceId::new(0x20)];
        sim.enable_runtime_notifications(&ids).await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..4 {
            let batch = sim
                .wait_resource_notifications(Duration::from_secs(20))
                .await
                .unwrap();
            seen.extend(batch.iter().map(|value| value.id));
        }
        for id in ids {
            assert!(seen.contains(&id), "{id} never notified");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rf_report_covers_all_serials() {
        let sim = session();
        sim.open().await.unwrap();

        let report = sim.detected_rf_devices().await.unwrap();
        assert_eq!(report.devices.len(), 2);
        assert_eq!(report.devices[0].serial, SerialNumber::new(900));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_drops_subscription() {
        let sim = session();
        sim.open().await.unwrap();
        sim.enable_runtime_notifications(&[DeviceId::new(0x10)])
            .await
            .unwrap();

        sim.reset().await;
        let result = sim.wait_resource_notifications(Duration::from_secs(1)).await;
        assert!(result.is_err());
    }
}
