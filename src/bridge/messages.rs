//! Wire messages exchanged between the sampler and the host dispatcher.
//!
//! Every message is a tagged record encoded as one JSON string. The sampler
//! encodes, the dispatcher decodes; undecodable text is dropped on the host
//! side because the boundary is best-effort by design.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Directional-pad key carried by the legacy-compatible `dpad` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DpadKey {
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for DpadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            DpadKey::Up => "up",
            DpadKey::Down => "down",
            DpadKey::Left => "left",
            DpadKey::Right => "right",
        };
        write!(f, "{}", key)
    }
}

/// Hardware attach/detach state carried by `status` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Connected,
    Disconnected,
}

/// A single button change: semantic name, raw index, digital flag, analog value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonMsg {
    pub button: String,
    pub index: usize,
    pub pressed: bool,
    pub value: f32,
}

/// A single axis change, post-deadzone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisMsg {
    pub axis: String,
    pub index: usize,
    pub value: f32,
}

/// Legacy companion for the four directional-pad buttons (indices 12-15).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DpadMsg {
    pub key: DpadKey,
    pub pressed: bool,
}

/// Discrete connect/disconnect signal, independent of the per-tick diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMsg {
    pub state: LinkState,
}

/// Descriptive device record, emitted only when its serialized form changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamepadInfo {
    pub connected: bool,
    pub index: Option<usize>,
    pub id: Option<String>,
    pub mapping: Option<String>,
    pub timestamp: Option<f64>,
    pub can_vibrate: bool,
    pub vendor: Option<String>,
    pub product: Option<String>,
    pub axes: usize,
    pub buttons: usize,
}

impl Default for GamepadInfo {
    fn default() -> Self {
        Self {
            connected: false,
            index: None,
            id: None,
            mapping: None,
            timestamp: None,
            can_vibrate: false,
            vendor: None,
            product: None,
            axes: 0,
            buttons: 0,
        }
    }
}

/// Aggregate snapshot of the tick, always emitted exactly once and last.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateMsg {
    pub pressed: Vec<String>,
    pub values: BTreeMap<String, f32>,
    pub axes: BTreeMap<String, f32>,
}

/// Tagged union over everything the sampler can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GamepadMessage {
    Button(ButtonMsg),
    Axis(AxisMsg),
    Dpad(DpadMsg),
    Status(StatusMsg),
    Info(GamepadInfo),
    State(StateMsg),
}

/// Host-to-sampler vibration command. `nonce` increases monotonically so the
/// sampling side can treat commands as latest-wins instead of a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VibrationCommand {
    Once {
        duration: u64,
        strong: f32,
        weak: f32,
        nonce: u64,
    },
    Stop {
        nonce: u64,
    },
}

impl VibrationCommand {
    pub fn nonce(&self) -> u64 {
        match self {
            VibrationCommand::Once { nonce, .. } => *nonce,
            VibrationCommand::Stop { nonce } => *nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_message_carries_its_tag() {
        let msg = GamepadMessage::Button(ButtonMsg {
            button: "a".into(),
            index: 0,
            pressed: true,
            value: 1.0,
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"button""#));
        assert!(json.contains(r#""button":"a""#));
        assert!(json.contains(r#""pressed":true"#));
    }

    #[test]
    fn info_fields_flatten_next_to_the_tag() {
        let msg = GamepadMessage::Info(GamepadInfo {
            connected: true,
            index: Some(0),
            id: Some("Pad (Vendor: 045e Product: 028e)".into()),
            mapping: Some("standard".into()),
            timestamp: Some(12.0),
            can_vibrate: true,
            vendor: Some("045e".into()),
            product: Some("028e".into()),
            axes: 4,
            buttons: 17,
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"info""#));
        assert!(json.contains(r#""canVibrate":true"#));
        assert!(json.contains(r#""vendor":"045e""#));
    }

    #[test]
    fn messages_survive_a_decode_round_trip() {
        let msg = GamepadMessage::Dpad(DpadMsg {
            key: DpadKey::Left,
            pressed: true,
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""key":"left""#));
        let back: GamepadMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn vibration_commands_use_lowercase_tags() {
        let once = VibrationCommand::Once {
            duration: 500,
            strong: 1.0,
            weak: 0.5,
            nonce: 3,
        };
        let json = serde_json::to_string(&once).unwrap();
        assert!(json.contains(r#""type":"once""#));
        assert_eq!(once.nonce(), 3);
        assert_eq!(VibrationCommand::Stop { nonce: 4 }.nonce(), 4);
    }
}
