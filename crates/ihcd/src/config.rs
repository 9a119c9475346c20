//! Daemon configuration: one TOML file layered with `IHCD_*` environment
//! variables via figment. The `[engine]` section maps straight onto
//! [`BridgeConfig`]; `[[devices]]` seeds the in-memory registry.

use std::path::Path;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use ihcd_core::{BridgeConfig, DeviceId, DeviceKind, DeviceRow, SerialNumber};

use crate::error::CliError;

/// Device type code the hub files all bridged switches under.
const SWITCH_DEVICE_TYPE: u8 = 244;

/// One configured device, the daemon-facing shape of a registry row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceEntry {
    /// Controller resource id, zero-padded hex.
    pub device_id: String,
    pub kind: DeviceKind,
    /// Wireless unit serial, decimal; "0" for wired devices.
    #[serde(default = "DeviceEntry::no_serial")]
    pub serial_number: String,
    #[serde(default = "DeviceEntry::default_battery")]
    pub battery: u8,
    #[serde(default = "DeviceEntry::default_signal")]
    pub signal: u8,
    #[serde(default = "DeviceEntry::default_watched")]
    pub watched: bool,
}

impl DeviceEntry {
    fn no_serial() -> String {
        "0".to_owned()
    }

    fn default_battery() -> u8 {
        255
    }

    fn default_signal() -> u8 {
        12
    }

    fn default_watched() -> bool {
        true
    }

    pub fn to_row(&self) -> DeviceRow {
        DeviceRow {
            device_id: self.device_id.clone(),
            device_type: SWITCH_DEVICE_TYPE,
            subtype: self.kind.code(),
            battery: self.battery,
            signal: self.signal,
            serial_number: self.serial_number.clone(),
            watched: self.watched,
        }
    }
}

/// Tuning for the simulated controller session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Seconds between simulated value-change notifications.
    pub notify_interval_secs: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            notify_interval_secs: 5,
        }
    }
}

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: BridgeConfig,
    pub simulator: SimulatorConfig,
    pub devices: Vec<DeviceEntry>,
}

impl Config {
    /// Load the TOML file (if present) layered under `IHCD_*` environment
    /// variables (`IHCD_ENGINE__PACING_SECS=2` style nesting).
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let config: Self = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("IHCD_").split("__"))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject entries the engine would only discover (and skip) at runtime.
    fn validate(&self) -> Result<(), CliError> {
        for entry in &self.devices {
            DeviceId::from_hex(&entry.device_id).map_err(|error| CliError::Validation {
                field: format!("devices.{}", entry.device_id),
                reason: error.to_string(),
            })?;
            SerialNumber::from_decimal(&entry.serial_number).map_err(|error| {
                CliError::Validation {
                    field: format!("devices.{}", entry.device_id),
                    reason: error.to_string(),
                }
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;

    fn from_toml(toml: &str) -> Result<Config, CliError> {
        let config: Config = Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.engine, BridgeConfig::default());
        assert_eq!(config.simulator.notify_interval_secs, 5);
        assert!(config.devices.is_empty());
    }

    #[test]
    fn full_document_parses() {
        let config = from_toml(
            r#"
            [engine]
            notification_timeout_secs = 5
            open_retry_cycles = 10

            [simulator]
            notify_interval_secs = 2

            [[devices]]
            device_id = "0001E4C0"
            kind = "dimmer"
            serial_number = "109955793651093"

            [[devices]]
            device_id = "00000020"
            kind = "fb-output"
            watched = false
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.notification_timeout_secs, 5);
        assert_eq!(config.engine.open_retry_cycles, 10);
        // Unset engine fields keep their defaults.
        assert_eq!(config.engine.maintenance_interval_cycles, 100);

        assert_eq!(config.devices.len(), 2);
        let row = config.devices[0].to_row();
        assert_eq!(row.subtype, DeviceKind::Dimmer.code());
        assert_eq!(row.device_type, SWITCH_DEVICE_TYPE);
        assert!(row.watched);
        assert!(!config.devices[1].watched);
    }

    #[test]
    fn bad_device_id_is_rejected() {
        let result = from_toml(
            r#"
            [[devices]]
            device_id = "not-hex"
            kind = "output"
            "#,
        );
        assert!(matches!(result, Err(CliError::Validation { .. })));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result = from_toml(
            r#"
            [[devices]]
            device_id = "00000010"
            kind = "toaster"
            "#,
        );
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "ihcd.toml",
                r#"
                [engine]
                pacing_secs = 1
                "#,
            )?;
            jail.set_env("IHCD_ENGINE__PACING_SECS", "3");

            let config = Config::load(Path::new("ihcd.toml")).expect("load");
            assert_eq!(config.engine.pacing_secs, 3);
            Ok(())
        });
    }
}
