//! Diff-and-emit engine: turns two consecutive snapshots into an ordered
//! list of wire messages.
//!
//! Per tick the order is fixed: the throttled `info` message (if any), then
//! button changes in ascending index order (each dpad index immediately
//! followed by its legacy companion), then axis changes in ascending index
//! order, then exactly one `state` message. A consumer folding the messages
//! sequentially always ends up consistent with that final `state`.

use super::info::build_info;
use super::messages::{AxisMsg, ButtonMsg, DpadMsg, GamepadMessage, StateMsg};
use super::names::{axis_name, button_name, dpad_key};
use super::source::{ButtonSample, PadSnapshot};
use std::collections::BTreeMap;
use tracing::debug;

/// Hysteresis band: analog deltas at or below this never count as a change.
/// Suppresses jitter on digital-feeling triggers. The value is inherited
/// from the wire protocol and has no documented derivation.
pub const VALUE_EPSILON: f32 = 0.01;

/// Default deadzone radius for stick axes.
pub const DEFAULT_AXIS_THRESHOLD: f32 = 0.15;

/// Last-emitted comparison state, exclusively owned by the diff engine and
/// updated once per tick after that tick's messages are computed. It only
/// ever reflects emitted state, never a pending one.
#[derive(Debug, Default)]
pub struct SamplerMemory {
    buttons: Vec<ButtonSample>,
    axes: Vec<f32>,
    last_info_json: Option<String>,
}

impl SamplerMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Clamp raw magnitudes inside the deadzone to exactly zero; values at or
/// beyond the threshold pass through unchanged.
pub fn apply_deadzone(value: f32, threshold: f32) -> f32 {
    if value.abs() < threshold {
        0.0
    } else {
        value
    }
}

fn button_change(index: usize, sample: ButtonSample) -> Vec<GamepadMessage> {
    let mut out = vec![GamepadMessage::Button(ButtonMsg {
        button: button_name(index),
        index,
        pressed: sample.pressed,
        value: sample.value,
    })];
    if let Some(key) = dpad_key(index) {
        out.push(GamepadMessage::Dpad(DpadMsg {
            key,
            pressed: sample.pressed,
        }));
    }
    out
}

/// Compare one tick's snapshot against the previous one and emit the
/// ordered message list. `None` is the disconnected snapshot: every
/// previously pressed button is released, every non-zero axis is zeroed,
/// one empty `state` closes the tick, and the comparison memory is cleared.
pub fn diff_tick(
    memory: &mut SamplerMemory,
    snapshot: Option<&PadSnapshot>,
    axis_threshold: f32,
) -> Vec<GamepadMessage> {
    let mut messages = Vec::new();

    // Device info first, throttled on its serialized form.
    let info = build_info(snapshot);
    if let Ok(json) = serde_json::to_string(&info) {
        if memory.last_info_json.as_deref() != Some(json.as_str()) {
            memory.last_info_json = Some(json);
            messages.push(GamepadMessage::Info(info));
        }
    }

    match snapshot {
        Some(pad) => {
            let mut pressed_now = Vec::new();
            let mut values = BTreeMap::new();
            let mut axes_state = BTreeMap::new();

            let mut next_buttons = Vec::with_capacity(pad.buttons.len());
            for (index, sample) in pad.buttons.iter().enumerate() {
                let prev = memory.buttons.get(index).copied().unwrap_or_default();
                let changed = prev.pressed != sample.pressed
                    || (prev.value - sample.value).abs() > VALUE_EPSILON;
                if changed {
                    messages.extend(button_change(index, *sample));
                }
                let name = button_name(index);
                if sample.pressed {
                    pressed_now.push(name.clone());
                }
                values.insert(name, sample.value);
                next_buttons.push(*sample);
            }

            let mut next_axes = Vec::with_capacity(pad.axes.len());
            for (index, raw) in pad.axes.iter().enumerate() {
                let value = apply_deadzone(*raw, axis_threshold);
                let prev = memory.axes.get(index).copied().unwrap_or(0.0);
                if (prev - value).abs() > VALUE_EPSILON {
                    messages.push(GamepadMessage::Axis(AxisMsg {
                        axis: axis_name(index),
                        index,
                        value,
                    }));
                }
                axes_state.insert(axis_name(index), value);
                next_axes.push(value);
            }

            messages.push(GamepadMessage::State(StateMsg {
                pressed: pressed_now,
                values,
                axes: axes_state,
            }));

            // Commit only after the tick's messages are computed.
            memory.buttons = next_buttons;
            memory.axes = next_axes;
        }
        None => {
            messages.extend(release_stuck_inputs(memory, true));
            messages.push(GamepadMessage::State(StateMsg::default()));
        }
    }

    messages
}

/// Synthesize releases for everything still held in memory, then clear it.
/// Used when the device vanishes, so no consumer ever observes a stuck
/// pressed button. Axis zeroing is only wanted on the polled absence path;
/// the discrete detach signal releases buttons only.
pub fn release_stuck_inputs(memory: &mut SamplerMemory, zero_axes: bool) -> Vec<GamepadMessage> {
    let mut messages = Vec::new();

    for (index, sample) in memory.buttons.iter().enumerate() {
        if sample.pressed {
            debug!(index, "releasing stuck button after device loss");
            messages.extend(button_change(
                index,
                ButtonSample {
                    pressed: false,
                    value: 0.0,
                },
            ));
        }
    }

    if zero_axes {
        for (index, value) in memory.axes.iter().enumerate() {
            if *value != 0.0 {
                messages.push(GamepadMessage::Axis(AxisMsg {
                    axis: axis_name(index),
                    index,
                    value: 0.0,
                }));
            }
        }
    }

    memory.buttons.clear();
    memory.axes.clear();
    messages
}
