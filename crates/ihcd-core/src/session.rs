// ── Controller session interface ──
//
// The network session to the IHC controller is an external collaborator:
// this module defines the seam the engine drives, not the SOAP transport
// behind it. Implementations must be internally synchronized -- the worker
// cycle and the command writer call in from different tasks.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{DeviceId, ResourceValue, RfReport};

/// Failure at the controller session seam.
///
/// Protocol faults carry the request/response detail the engine dumps when
/// logging them; transports that cannot reconstruct one side pass a
/// placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("controller transport failed: {reason}")]
    Transport { reason: String },

    #[error("unexpected controller response to {request}")]
    Protocol { request: String, response: String },
}

/// The stateful network session to the controller.
///
/// All operations address the single session as a unit; `reset` tears it
/// down unconditionally and is safe to call in any state. `open` performs
/// exactly one attempt -- retry policy belongs to the caller.
#[async_trait]
pub trait ControllerSession: Send + Sync + 'static {
    /// Open (authenticate) the session. One attempt, no internal retry.
    async fn open(&self) -> Result<(), SessionError>;

    /// Drop the session and release its resources. Idempotent.
    async fn reset(&self);

    /// Graceful session termination.
    async fn logout(&self) -> Result<(), SessionError>;

    /// Replace the set of resource ids the controller notifies on.
    async fn enable_runtime_notifications(&self, ids: &[DeviceId]) -> Result<(), SessionError>;

    /// Block until the controller delivers a batch of value changes, or the
    /// timeout elapses. A timeout yields an empty batch, not an error. Must
    /// be cancel-safe: the engine races this against shutdown.
    async fn wait_resource_notifications(
        &self,
        timeout: Duration,
    ) -> Result<Vec<ResourceValue>, SessionError>;

    /// Apply one resource update. `Ok(false)` means the controller refused
    /// the value; transport trouble is an `Err`.
    async fn resource_update(&self, value: &ResourceValue) -> Result<bool, SessionError>;

    /// The controller's report of currently detected wireless devices.
    async fn detected_rf_devices(&self) -> Result<RfReport, SessionError>;
}
