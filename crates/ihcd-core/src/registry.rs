// ── Persistent device registry interface ──
//
// The registry is the hub's relational store of known devices, scoped to
// one hardware instance. The engine reads rows to (re)build its cache and
// writes back refreshed battery/signal levels; schema and query mechanics
// belong to the implementation. `MemoryRegistry` is the in-tree
// implementation used by the daemon and the test suite.

use std::sync::RwLock;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::model::SerialNumber;

/// One persisted device row, in its stored text forms.
///
/// `device_id` is zero-padded hex; `serial_number` is decimal with `"0"`
/// meaning no serial. Parsing happens in the engine, not here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceRow {
    pub device_id: String,
    pub device_type: u8,
    pub subtype: u8,
    #[serde(default)]
    pub battery: u8,
    #[serde(default)]
    pub signal: u8,
    #[serde(default = "DeviceRow::no_serial")]
    pub serial_number: String,
    #[serde(default)]
    pub watched: bool,
}

impl DeviceRow {
    fn no_serial() -> String {
        "0".to_owned()
    }
}

/// Failure at the registry seam.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("registry query failed: {reason}")]
    Query { reason: String },

    #[error("registry update failed: {reason}")]
    Update { reason: String },
}

/// Relational store of known devices for one hardware instance.
///
/// Both query methods must return rows in a stable order across calls --
/// the engine compares consecutive watch-list query results by sequence.
#[async_trait]
pub trait DeviceRegistry: Send + Sync + 'static {
    /// Every row for this hardware instance, watched or not.
    async fn all_devices(&self) -> Result<Vec<DeviceRow>, RegistryError>;

    /// Hex ids of the rows currently marked watched.
    async fn watched_ids(&self) -> Result<Vec<String>, RegistryError>;

    /// Persist refreshed levels for every row bearing this serial number.
    async fn store_levels(
        &self,
        serial: SerialNumber,
        battery: u8,
        signal: u8,
    ) -> Result<(), RegistryError>;
}

// ── In-memory implementation ────────────────────────────────────────

/// Insertion-ordered in-memory registry.
///
/// Query order is the insertion order, so repeated queries over unchanged
/// data always yield identical sequences.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    rows: RwLock<IndexMap<String, DeviceRow>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = DeviceRow>) -> Self {
        let registry = Self::new();
        for row in rows {
            registry.insert(row);
        }
        registry
    }

    /// Insert or replace a row, keyed by its hex device id. Replacement
    /// keeps the row's original position.
    pub fn insert(&self, row: DeviceRow) {
        if let Ok(mut rows) = self.rows.write() {
            rows.insert(row.device_id.clone(), row);
        }
    }

    /// Flip a device's watched flag. Returns `false` for unknown ids.
    pub fn set_watched(&self, device_id: &str, watched: bool) -> bool {
        match self.rows.write() {
            Ok(mut rows) => match rows.get_mut(device_id) {
                Some(row) => {
                    row.watched = watched;
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    /// Snapshot of all rows, in query order.
    pub fn rows(&self) -> Vec<DeviceRow> {
        self.rows
            .read()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DeviceRegistry for MemoryRegistry {
    async fn all_devices(&self) -> Result<Vec<DeviceRow>, RegistryError> {
        let rows = self.rows.read().map_err(|_| RegistryError::Query {
            reason: "registry lock poisoned".to_owned(),
        })?;
        Ok(rows.values().cloned().collect())
    }

    async fn watched_ids(&self) -> Result<Vec<String>, RegistryError> {
        let rows = self.rows.read().map_err(|_| RegistryError::Query {
            reason: "registry lock poisoned".to_owned(),
        })?;
        Ok(rows
            .values()
            .filter(|row| row.watched)
            .map(|row| row.device_id.clone())
            .collect())
    }

    async fn store_levels(
        &self,
        serial: SerialNumber,
        battery: u8,
        signal: u8,
    ) -> Result<(), RegistryError> {
        let mut rows = self.rows.write().map_err(|_| RegistryError::Update {
            reason: "registry lock poisoned".to_owned(),
        })?;
        let key = serial.to_string();
        for row in rows.values_mut() {
            if row.serial_number == key {
                row.battery = battery;
                row.signal = signal;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(id: &str, serial: &str, watched: bool) -> DeviceRow {
        DeviceRow {
            device_id: id.to_owned(),
            device_type: 244,
            subtype: 5,
            battery: 255,
            signal: 12,
            serial_number: serial.to_owned(),
            watched,
        }
    }

    #[tokio::test]
    async fn query_order_is_insertion_order() {
        let registry =
            MemoryRegistry::from_rows([row("00000030", "0", true), row("00000010", "0", true)]);

        let ids = registry.watched_ids().await.unwrap();
        assert_eq!(ids, vec!["00000030".to_owned(), "00000010".to_owned()]);

        // Updating a row must not move it.
        registry.insert(row("00000030", "7", true));
        let ids = registry.watched_ids().await.unwrap();
        assert_eq!(ids, vec!["00000030".to_owned(), "00000010".to_owned()]);
    }

    #[tokio::test]
    async fn watched_ids_filters_unwatched() {
        let registry =
            MemoryRegistry::from_rows([row("00000010", "0", true), row("00000020", "0", false)]);

        let ids = registry.watched_ids().await.unwrap();
        assert_eq!(ids, vec!["00000010".to_owned()]);
    }

    #[tokio::test]
    async fn store_levels_hits_every_row_with_serial() {
        let registry = MemoryRegistry::from_rows([
            row("00000010", "4242", true),
            row("00000020", "4242", true),
            row("00000030", "7", true),
        ]);

        registry
            .store_levels(SerialNumber::new(4242), 100, 14)
            .await
            .unwrap();

        let rows = registry.rows();
        assert_eq!((rows[0].battery, rows[0].signal), (100, 14));
        assert_eq!((rows[1].battery, rows[1].signal), (100, 14));
        assert_eq!((rows[2].battery, rows[2].signal), (255, 12));
    }

    #[tokio::test]
    async fn set_watched_unknown_id_is_false() {
        let registry = MemoryRegistry::new();
        assert!(!registry.set_watched("0000FFFF", true));
    }
}
