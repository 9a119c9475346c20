// ── Core domain types ──
//
// Identity newtypes and the command/value vocabulary shared by the engine
// and its collaborators. Registry rows persist device ids as zero-padded
// hex text and serial numbers as decimal text; both are re-parsed here with
// explicit validation instead of fixed-width buffer formatting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ── Parse errors ────────────────────────────────────────────────────

/// Failure to interpret a persisted registry field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid device id '{value}'")]
    InvalidDeviceId { value: String },

    #[error("invalid serial number '{value}'")]
    InvalidSerial { value: String },

    #[error("unknown device subtype code {code}")]
    UnknownDeviceKind { code: u8 },
}

// ── DeviceId ────────────────────────────────────────────────────────

/// Controller-side resource id of a device channel.
///
/// Stable and unique per hardware instance. Persisted as zero-padded
/// uppercase hex (`{:08X}`), the controller's native id notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Parse the registry's hex text form. At most eight hex digits, so the
    /// value always fits in `u32`.
    pub fn from_hex(text: &str) -> Result<Self, ParseError> {
        let digits = text.trim();
        if digits.is_empty()
            || digits.len() > 8
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(ParseError::InvalidDeviceId {
                value: text.to_owned(),
            });
        }
        u32::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseError::InvalidDeviceId {
                value: text.to_owned(),
            })
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// ── SerialNumber ────────────────────────────────────────────────────

/// Manufacturer serial of a physical wireless unit.
///
/// One serial may back several logical device channels (multi-channel
/// sensors). Zero is the registry's "no serial" marker and never appears
/// inside a constructed `SerialNumber`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerialNumber(u64);

impl SerialNumber {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Parse the registry's decimal text form. Empty or `"0"` means the
    /// device has no serial (wired, non-wireless).
    pub fn from_decimal(text: &str) -> Result<Option<Self>, ParseError> {
        let digits = text.trim();
        if digits.is_empty() {
            return Ok(None);
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidSerial {
                value: text.to_owned(),
            });
        }
        let value: u64 = digits.parse().map_err(|_| ParseError::InvalidSerial {
            value: text.to_owned(),
        })?;
        Ok((value != 0).then_some(Self(value)))
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── DeviceKind ──────────────────────────────────────────────────────

/// Device subtype, decoded once from the registry's small-integer code.
///
/// Drives the write-path dispatch: contact-style kinds take boolean
/// resource updates, dimmers take integer levels, and feedback outputs
/// cannot be written at all.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[repr(u8)]
pub enum DeviceKind {
    /// Wall switch / dataline input channel.
    Input = 1,
    /// Relay / dataline output channel.
    Output = 2,
    /// Function-block input resource.
    FbInput = 3,
    /// Function-block output resource (read-only upstream).
    FbOutput = 4,
    /// Wireless dimmer channel.
    Dimmer = 5,
}

impl DeviceKind {
    /// The registry's persisted subtype code.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for DeviceKind {
    type Error = ParseError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Input),
            2 => Ok(Self::Output),
            3 => Ok(Self::FbInput),
            4 => Ok(Self::FbOutput),
            5 => Ok(Self::Dimmer),
            other => Err(ParseError::UnknownDeviceKind { code: other }),
        }
    }
}

// ── Resource values (controller wire vocabulary) ────────────────────

/// Payload of a controller resource: boolean for contact-style resources,
/// ranged integer for dimmer levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Bool(bool),
    Level(i32),
}

impl ResourceState {
    /// Numeric view used by the translation layer (`true` reads as 1).
    pub const fn as_int(self) -> i32 {
        match self {
            Self::Bool(true) => 1,
            Self::Bool(false) => 0,
            Self::Level(value) => value,
        }
    }
}

/// A single controller-side value: one change notification, or one update
/// to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceValue {
    pub id: DeviceId,
    pub state: ResourceState,
}

impl ResourceValue {
    pub const fn binary(id: DeviceId, on: bool) -> Self {
        Self {
            id,
            state: ResourceState::Bool(on),
        }
    }

    pub const fn level(id: DeviceId, level: i32) -> Self {
        Self {
            id,
            state: ResourceState::Level(level),
        }
    }
}

// ── Write path (hub → controller) ───────────────────────────────────

/// What the hub asked a switch to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchAction {
    On { level: u8 },
    Off,
    SetLevel { level: u8 },
}

/// An inbound hub command, decoded at the boundary into an explicit
/// variant instead of a raw command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchRequest {
    pub device_id: DeviceId,
    pub kind: DeviceKind,
    pub action: SwitchAction,
}

// ── Notification path (controller → hub) ────────────────────────────

/// Hub-generic command kind derived from a notification value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchCommand {
    SetLevel(i32),
    Off,
}

/// A translated change notification, ready for the upstream sink.
///
/// The originating device's last-known battery travels next to the
/// command as signal-quality metadata, not inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatedCommand {
    pub device_id: DeviceId,
    pub command: SwitchCommand,
    pub subtype: DeviceKind,
    pub signal: u8,
    pub unit_code: u8,
}

// ── RF maintenance report ───────────────────────────────────────────

/// One entry of the controller's detected-wireless-devices report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RfDevice {
    pub serial: SerialNumber,
    /// Raw battery indicator; `1` means good, everything else low.
    pub battery_indicator: u8,
    /// Raw signal strength on the controller's fine-grained scale.
    pub signal_strength: u8,
}

/// The controller's wireless-device report, keyed by serial number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RfReport {
    pub devices: Vec<RfDevice>,
}

impl RfReport {
    /// Structurally empty: no child data under the report node.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
