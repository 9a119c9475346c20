// ── Engine error taxonomy ──
//
// Collaborator seam errors are translated into engine-level kinds here;
// the worker cycle matches on the kind to pick its recovery (reset and
// rebuild for transport/protocol faults, plain logging for the rest).
// Nothing in this taxonomy ever terminates the worker.

use thiserror::Error;

use crate::model::DeviceKind;
use crate::registry::RegistryError;
use crate::session::SessionError;
use crate::sink::SinkError;

/// Unified error type for the synchronization engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Network/session failure during open, wait, or update. Recovery:
    /// reset the session and rebuild all caches on the next pass.
    #[error("controller transport failed: {reason}")]
    Transport { reason: String },

    /// Malformed or unexpected controller response. Same recovery as
    /// transport failures, logged with both sides of the exchange.
    #[error("controller protocol fault on {request}")]
    Protocol { request: String, response: String },

    /// The persistent registry refused a read or write.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The hub did not accept a delivered command.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Write attempted against a subtype that cannot be driven.
    #[error("unsupported write target: {kind}")]
    Unsupported { kind: DeviceKind },
}

impl From<SessionError> for BridgeError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Transport { reason } => Self::Transport { reason },
            SessionError::Protocol { request, response } => Self::Protocol { request, response },
        }
    }
}
