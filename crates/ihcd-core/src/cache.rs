// ── In-memory device cache ──
//
// Maps device id to cached metadata, with a serial-number multimap for the
// maintenance sweep (one physical wireless unit may back several logical
// channels). The whole cache is rebuilt per session and published through
// one atomic swap -- readers never observe a half-built snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use tracing::warn;

use crate::model::{DeviceId, DeviceKind, ParseError, SerialNumber};
use crate::registry::DeviceRow;

/// Cached metadata for one device channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedDevice {
    pub serial: Option<SerialNumber>,
    pub device_type: u8,
    pub kind: DeviceKind,
    pub battery: u8,
    pub signal: u8,
}

/// Outcome of one cache rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSummary {
    pub devices: usize,
    /// Entries reachable through the serial index.
    pub wireless: usize,
    /// Registry rows dropped because a field failed to parse.
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    devices: DashMap<DeviceId, CachedDevice>,
    by_serial: HashMap<SerialNumber, Vec<DeviceId>>,
}

/// The engine's device cache plus serial index.
///
/// Lookups and level updates run concurrently against the current
/// snapshot; `rebuild` replaces the snapshot wholesale.
#[derive(Debug, Default)]
pub struct DeviceCache {
    inner: ArcSwap<CacheInner>,
}

impl DeviceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh cache and serial index from registry rows and publish
    /// both atomically. Rows with unparseable fields are logged and
    /// skipped. Expensive relative to the cycle -- callers run this once
    /// per new session, not per cycle.
    pub fn rebuild(&self, rows: &[DeviceRow]) -> RebuildSummary {
        let devices = DashMap::with_capacity(rows.len());
        let mut by_serial: HashMap<SerialNumber, Vec<DeviceId>> = HashMap::new();
        let mut skipped = 0usize;

        for row in rows {
            match parse_row(row) {
                Ok((id, entry)) => {
                    if let Some(serial) = entry.serial {
                        by_serial.entry(serial).or_default().push(id);
                    }
                    devices.insert(id, entry);
                }
                Err(error) => {
                    warn!(device = %row.device_id, %error, "skipping unparseable registry row");
                    skipped += 1;
                }
            }
        }

        let summary = RebuildSummary {
            devices: devices.len(),
            wireless: by_serial.values().map(Vec::len).sum(),
            skipped,
        };
        self.inner.store(Arc::new(CacheInner { devices, by_serial }));
        summary
    }

    /// Resolve a notification's originating device.
    pub fn lookup(&self, id: DeviceId) -> Option<CachedDevice> {
        self.inner.load().devices.get(&id).map(|entry| *entry)
    }

    /// Update battery/signal on every device sharing this serial number.
    /// Returns how many entries were touched.
    pub fn set_levels(&self, serial: SerialNumber, battery: u8, signal: u8) -> usize {
        let inner = self.inner.load();
        let Some(ids) = inner.by_serial.get(&serial) else {
            return 0;
        };
        let mut touched = 0;
        for id in ids {
            if let Some(mut entry) = inner.devices.get_mut(id) {
                entry.battery = battery;
                entry.signal = signal;
                touched += 1;
            }
        }
        touched
    }

    pub fn len(&self) -> usize {
        self.inner.load().devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.load().devices.is_empty()
    }
}

fn parse_row(row: &DeviceRow) -> Result<(DeviceId, CachedDevice), ParseError> {
    let id = DeviceId::from_hex(&row.device_id)?;
    let serial = SerialNumber::from_decimal(&row.serial_number)?;
    let kind = DeviceKind::try_from(row.subtype)?;
    Ok((
        id,
        CachedDevice {
            serial,
            device_type: row.device_type,
            kind,
            battery: row.battery,
            signal: row.signal,
        },
    ))
}
