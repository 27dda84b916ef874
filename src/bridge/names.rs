//! Static lookup tables from raw controller indices to semantic names.
//!
//! The tables follow the standard gamepad layout. Indices beyond the known
//! set fall back to `button-<n>` / `axis-<n>` so no sample is ever dropped
//! for lacking a name.

use super::messages::DpadKey;

pub const BUTTON_NAMES: [&str; 18] = [
    "a", "b", "x", "y", "lb", "rb", "lt", "rt", "back", "start", "ls", "rs", "dpadUp", "dpadDown",
    "dpadLeft", "dpadRight", "home", "touchpad",
];

pub const AXIS_NAMES: [&str; 4] = ["leftX", "leftY", "rightX", "rightY"];

/// Standard-layout indices of the four directional-pad buttons.
pub const DPAD_UP: usize = 12;
pub const DPAD_DOWN: usize = 13;
pub const DPAD_LEFT: usize = 14;
pub const DPAD_RIGHT: usize = 15;

pub fn button_name(index: usize) -> String {
    match BUTTON_NAMES.get(index) {
        Some(name) => (*name).to_string(),
        None => format!("button-{}", index),
    }
}

pub fn axis_name(index: usize) -> String {
    match AXIS_NAMES.get(index) {
        Some(name) => (*name).to_string(),
        None => format!("axis-{}", index),
    }
}

/// Directional-pad key for a button index, if it is one of the four dpad slots.
pub fn dpad_key(index: usize) -> Option<DpadKey> {
    match index {
        DPAD_UP => Some(DpadKey::Up),
        DPAD_DOWN => Some(DpadKey::Down),
        DPAD_LEFT => Some(DpadKey::Left),
        DPAD_RIGHT => Some(DpadKey::Right),
        _ => None,
    }
}
