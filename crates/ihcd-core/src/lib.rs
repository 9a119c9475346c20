//! Device-synchronization engine bridging an LK IHC installation bus to a
//! generic home-automation hub.
//!
//! The engine keeps a persistent session to the IHC controller, tracks the
//! dynamic set of watched devices, translates asynchronous value-change
//! notifications into the hub's switch/dimmer command vocabulary, and
//! applies hub commands back onto controller resources -- tolerating an
//! unreliable link and a controller that silently drops sessions.
//!
//! - **[`Bridge`]** — Central facade, one per hardware connection.
//!   [`start()`](Bridge::start) spawns the repeating worker cycle
//!   (connection check → watch-list sync → notification wait → periodic
//!   battery/signal maintenance); [`write()`](Bridge::write) pushes hub
//!   commands to the controller from any task; [`stop()`](Bridge::stop)
//!   shuts down cooperatively with join semantics.
//!
//! - **Collaborator seams** — [`ControllerSession`] (the network session,
//!   implemented by a transport crate), [`DeviceRegistry`] (the hub's
//!   persistent device store; [`MemoryRegistry`] ships in-tree), and
//!   [`CommandSink`] (the hub's ingestion pipeline).
//!
//! - **[`DeviceCache`]** — id → metadata map plus serial-number multimap,
//!   rebuilt atomically per session from registry rows.
//!
//! - **[`convert`]** — the pure translation layer: notification values to
//!   hub commands, hub requests to resource updates, and the coarse
//!   battery/signal quantizers.

pub mod bridge;
pub mod cache;
pub mod config;
pub mod connection;
pub mod convert;
pub mod error;
pub mod model;
pub mod registry;
pub mod session;
pub mod sink;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{Bridge, StatsSnapshot};
pub use cache::{CachedDevice, DeviceCache, RebuildSummary};
pub use config::BridgeConfig;
pub use connection::ConnectionState;
pub use error::BridgeError;
pub use registry::{DeviceRegistry, DeviceRow, MemoryRegistry, RegistryError};
pub use session::{ControllerSession, SessionError};
pub use sink::{CommandSink, SinkError, TracingSink};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DeviceId, DeviceKind, ParseError, ResourceState, ResourceValue, RfDevice, RfReport,
    SerialNumber, SwitchAction, SwitchCommand, SwitchRequest, TranslatedCommand,
};
