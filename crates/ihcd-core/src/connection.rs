// ── Connection state machine ──
//
// Owns the single controller session and the engine's view of whether it
// is usable. State changes happen only on the outcomes of explicit open/
// reset/logout calls -- the session trait itself exposes no state, so
// there is exactly one source of truth.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::BridgeError;
use crate::session::ControllerSession;

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// The engine's handle on the controller session.
#[derive(Debug)]
pub(crate) struct Link<S> {
    session: S,
    state: watch::Sender<ConnectionState>,
}

impl<S: ControllerSession> Link<S> {
    pub(crate) fn new(session: S) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self { session, state }
    }

    pub(crate) fn session(&self) -> &S {
        &self.session
    }

    pub(crate) fn is_connected(&self) -> bool {
        *self.state.borrow() == ConnectionState::Connected
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// One open attempt. Failure resets the session so the next attempt
    /// starts from a clean slate; retry pacing belongs to the worker.
    pub(crate) async fn open(&self) -> Result<(), BridgeError> {
        match self.session.open().await {
            Ok(()) => {
                self.state.send_replace(ConnectionState::Connected);
                info!("controller session open");
                Ok(())
            }
            Err(error) => {
                self.reset().await;
                Err(error.into())
            }
        }
    }

    /// Open only if not already connected.
    pub(crate) async fn ensure_open(&self) -> Result<(), BridgeError> {
        if self.is_connected() {
            Ok(())
        } else {
            self.open().await
        }
    }

    /// Tear the session down and land on `Disconnected`. Idempotent.
    pub(crate) async fn reset(&self) {
        self.session.reset().await;
        self.state.send_replace(ConnectionState::Disconnected);
    }

    /// Graceful termination, best-effort.
    pub(crate) async fn logout(&self) {
        if let Err(error) = self.session.logout().await {
            warn!(%error, "controller logout failed (non-fatal)");
        }
        self.state.send_replace(ConnectionState::Disconnected);
    }
}
