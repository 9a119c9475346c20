// ── Upstream delivery sink ──
//
// Where translated commands go: the hub's ingestion pipeline. The engine
// awaits every delivery before translating the next notification, so
// ordering within a batch is the sink's to keep only per call.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{SwitchCommand, TranslatedCommand};

/// Failure to hand a command to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("upstream delivery failed: {reason}")]
pub struct SinkError {
    pub reason: String,
}

/// Ingestion seam toward the hub.
#[async_trait]
pub trait CommandSink: Send + Sync + 'static {
    /// Deliver one translated command, with the device's last-known battery
    /// level as auxiliary quality data. Resolves once the hub has accepted
    /// the command.
    async fn deliver(&self, command: TranslatedCommand, battery: u8) -> Result<(), SinkError>;
}

/// Sink that emits each command as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl CommandSink for TracingSink {
    async fn deliver(&self, command: TranslatedCommand, battery: u8) -> Result<(), SinkError> {
        match command.command {
            SwitchCommand::SetLevel(level) => tracing::info!(
                device = %command.device_id,
                subtype = %command.subtype,
                signal = command.signal,
                battery,
                level,
                "switch level"
            ),
            SwitchCommand::Off => tracing::info!(
                device = %command.device_id,
                subtype = %command.subtype,
                signal = command.signal,
                battery,
                "switch off"
            ),
        }
        Ok(())
    }
}
