// ── Value/command translation ──
//
// The pure translation layer between controller resource values and the
// hub's generic switch vocabulary, plus the maintenance quantizers. No IO,
// no state -- everything here is a total function over its inputs.

use crate::cache::CachedDevice;
use crate::error::BridgeError;
use crate::model::{
    ResourceValue, SwitchAction, SwitchCommand, SwitchRequest, TranslatedCommand,
};

/// Translate one change notification into a hub command.
///
/// A value above 1 is a set-level carrying that value -- genuine dimmer
/// levels and boolean-style "on" conditions alike; everything else is an
/// off. Magnitude is the whole policy; there is no per-type path.
pub fn notification_to_command(
    value: &ResourceValue,
    device: &CachedDevice,
) -> TranslatedCommand {
    let level = value.state.as_int();
    let command = if level > 1 {
        SwitchCommand::SetLevel(level)
    } else {
        SwitchCommand::Off
    };
    TranslatedCommand {
        device_id: value.id,
        command,
        subtype: device.kind,
        signal: device.signal,
        unit_code: 0,
    }
}

/// Translate an inbound hub request into the resource update to apply.
///
/// Dispatches purely on the request's subtype: contact-style kinds take a
/// boolean (`On` maps to true, anything else to false), dimmers take an
/// integer level, feedback outputs cannot be driven at all.
pub fn request_to_update(request: &SwitchRequest) -> Result<ResourceValue, BridgeError> {
    use crate::model::DeviceKind as Kind;

    match request.kind {
        Kind::Input | Kind::Output | Kind::FbInput => Ok(ResourceValue::binary(
            request.device_id,
            matches!(request.action, SwitchAction::On { .. }),
        )),
        Kind::FbOutput => Err(BridgeError::Unsupported { kind: request.kind }),
        Kind::Dimmer => {
            let level = match request.action {
                SwitchAction::Off => 0,
                SwitchAction::On { level } | SwitchAction::SetLevel { level } => i32::from(level),
            };
            Ok(ResourceValue::level(request.device_id, level))
        }
    }
}

/// Coarse two-level battery quantization: the controller's "good"
/// indicator becomes 100, every other indicator 9. Not a percentage.
pub const fn quantize_battery(raw: u8) -> u8 {
    if raw == 1 { 100 } else { 9 }
}

/// Coarsen the controller's fine-grained signal scale into the cache's
/// range by dropping the two low bits.
pub const fn quantize_signal(raw: u8) -> u8 {
    raw >> 2
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceId, DeviceKind, ResourceState, SerialNumber};
    use pretty_assertions::assert_eq;

    fn dimmer() -> CachedDevice {
        CachedDevice {
            serial: Some(SerialNumber::new(4242)),
            device_type: 244,
            kind: DeviceKind::Dimmer,
            battery: 100,
            signal: 5,
        }
    }

    fn request(kind: DeviceKind, action: SwitchAction) -> SwitchRequest {
        SwitchRequest {
            device_id: DeviceId::new(0x10),
            kind,
            action,
        }
    }

    // ── Notification path ───────────────────────────────────────────

    #[test]
    fn value_above_one_is_set_level() {
        for level in [2, 3, 40, 100, i32::MAX] {
            let value = ResourceValue::level(DeviceId::new(0x10), level);
            let command = notification_to_command(&value, &dimmer());
            assert_eq!(command.command, SwitchCommand::SetLevel(level));
        }
    }

    #[test]
    fn value_at_or_below_one_is_off() {
        for state in [
            ResourceState::Level(1),
            ResourceState::Level(0),
            ResourceState::Level(-3),
            ResourceState::Bool(true),
            ResourceState::Bool(false),
        ] {
            let value = ResourceValue {
                id: DeviceId::new(0x10),
                state,
            };
            let command = notification_to_command(&value, &dimmer());
            assert_eq!(command.command, SwitchCommand::Off, "state {state:?}");
        }
    }

    #[test]
    fn command_carries_cached_metadata() {
        let value = ResourceValue::level(DeviceId::new(0x10), 3);
        let command = notification_to_command(&value, &dimmer());

        assert_eq!(command.device_id, DeviceId::new(0x10));
        assert_eq!(command.subtype, DeviceKind::Dimmer);
        assert_eq!(command.signal, 5);
        assert_eq!(command.unit_code, 0);
    }

    // ── Write path ──────────────────────────────────────────────────

    #[test]
    fn contact_kinds_map_on_to_true() {
        for kind in [DeviceKind::Input, DeviceKind::Output, DeviceKind::FbInput] {
            let update = request_to_update(&request(kind, SwitchAction::On { level: 40 })).unwrap();
            assert_eq!(update.state, ResourceState::Bool(true));
        }
    }

    #[test]
    fn contact_kinds_map_everything_else_to_false() {
        for action in [SwitchAction::Off, SwitchAction::SetLevel { level: 40 }] {
            let update = request_to_update(&request(DeviceKind::Output, action)).unwrap();
            assert_eq!(update.state, ResourceState::Bool(false));
        }
    }

    #[test]
    fn feedback_output_is_rejected() {
        let result = request_to_update(&request(DeviceKind::FbOutput, SwitchAction::Off));
        assert!(matches!(
            result,
            Err(BridgeError::Unsupported {
                kind: DeviceKind::FbOutput
            })
        ));
    }

    #[test]
    fn dimmer_levels() {
        let off = request_to_update(&request(DeviceKind::Dimmer, SwitchAction::Off)).unwrap();
        assert_eq!(off.state, ResourceState::Level(0));

        let on =
            request_to_update(&request(DeviceKind::Dimmer, SwitchAction::On { level: 40 }))
                .unwrap();
        assert_eq!(on.state, ResourceState::Level(40));

        let set = request_to_update(&request(
            DeviceKind::Dimmer,
            SwitchAction::SetLevel { level: 73 },
        ))
        .unwrap();
        assert_eq!(set.state, ResourceState::Level(73));
    }

    #[test]
    fn update_addresses_the_requested_device() {
        let update =
            request_to_update(&request(DeviceKind::Dimmer, SwitchAction::Off)).unwrap();
        assert_eq!(update.id, DeviceId::new(0x10));
    }

    // ── Quantizers ──────────────────────────────────────────────────

    #[test]
    fn battery_is_two_valued() {
        assert_eq!(quantize_battery(1), 100);
        for raw in [0u8, 2, 3, 9, 100, 255] {
            assert_eq!(quantize_battery(raw), 9, "raw {raw}");
        }
    }

    #[test]
    fn signal_drops_two_bits() {
        for raw in 0..=u8::MAX {
            let quantized = quantize_signal(raw);
            assert_eq!(quantized, raw >> 2);
            // Round trip: the raw value lies in the quantized bucket.
            let low = u16::from(quantized) * 4;
            assert!((low..low + 4).contains(&u16::from(raw)));
        }
    }
}
