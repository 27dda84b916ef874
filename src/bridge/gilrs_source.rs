//! gilrs-backed snapshot source.
//!
//! Reads the standard 17-button / 4-axis layout from whichever gamepad the
//! backend reports first, and plays dual-magnitude rumble through the force
//! feedback API when the device supports it.

use chrono::Local;
use gilrs::ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder, Repeat, Replay, Ticks};
use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};
use tracing::{debug, info, warn};

use super::messages::LinkState;
use super::source::{ButtonSample, PadSnapshot, PadSource, SourceError};

/// Standard-layout button order: index n here is wire index n.
const STANDARD_BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

const STANDARD_AXES: [Axis; 4] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
];

pub struct GilrsSource {
    gilrs: Gilrs,
    // Rumble playback stops when the effect is dropped.
    active_effect: Option<Effect>,
    // Wall-clock millis of the last observed input event. Snapshots carry
    // this instead of the current time so the device-info record only
    // changes when the device actually does something.
    last_event_ms: f64,
}

impl GilrsSource {
    pub fn new() -> Result<Self, SourceError> {
        info!("Initializing gilrs input backend");
        let gilrs = Gilrs::new().map_err(|e| SourceError::InitializationError(e.to_string()))?;
        for (id, gamepad) in gilrs.gamepads() {
            info!("Found gamepad {}: {}", id, gamepad.name());
        }
        Ok(Self {
            gilrs,
            active_effect: None,
            last_event_ms: 0.0,
        })
    }

    fn first_gamepad_id(&self) -> Option<GamepadId> {
        self.gilrs.gamepads().next().map(|(id, _)| id)
    }
}

impl PadSource for GilrsSource {
    fn poll(&mut self) -> Option<PadSnapshot> {
        let id = self.first_gamepad_id()?;
        let gamepad = self.gilrs.gamepad(id);
        if !gamepad.is_connected() {
            return None;
        }

        let id_string = match (gamepad.vendor_id(), gamepad.product_id()) {
            (Some(vendor), Some(product)) => format!(
                "{} (Vendor: {:04x} Product: {:04x})",
                gamepad.name(),
                vendor,
                product
            ),
            _ => gamepad.name().to_string(),
        };

        let buttons = STANDARD_BUTTONS
            .iter()
            .map(|button| ButtonSample {
                pressed: gamepad.is_pressed(*button),
                value: gamepad
                    .button_data(*button)
                    .map(|data| data.value())
                    .unwrap_or(0.0),
            })
            .collect();

        // gilrs reports stick up as positive; the wire convention is the
        // browser's, where down is positive.
        let axes = STANDARD_AXES
            .iter()
            .enumerate()
            .map(|(index, axis)| {
                let value = gamepad
                    .axis_data(*axis)
                    .map(|data| data.value())
                    .unwrap_or(0.0);
                if index % 2 == 1 {
                    -value
                } else {
                    value
                }
            })
            .collect();

        Some(PadSnapshot {
            index: 0,
            id: id_string,
            mapping: "standard".to_string(),
            can_vibrate: gamepad.is_ff_supported(),
            timestamp: self.last_event_ms,
            buttons,
            axes,
        })
    }

    fn next_link_event(&mut self) -> Option<LinkState> {
        while let Some(event) = self.gilrs.next_event() {
            self.last_event_ms = Local::now().timestamp_millis() as f64;
            match event.event {
                EventType::Connected => return Some(LinkState::Connected),
                EventType::Disconnected => return Some(LinkState::Disconnected),
                _ => {
                    // Button/axis events are read from gamepad state during
                    // poll; draining them here keeps that state current.
                    debug!("Drained gilrs event: {:?}", event.event);
                }
            }
        }
        None
    }

    fn vibrate(&mut self, duration_ms: u64, strong: f32, weak: f32) {
        let Some(id) = self.first_gamepad_id() else {
            return;
        };
        if !self.gilrs.gamepad(id).is_ff_supported() {
            debug!("Gamepad has no force feedback support, ignoring vibration");
            return;
        }

        let magnitude = |v: f32| (v.clamp(0.0, 1.0) * f32::from(u16::MAX)) as u16;
        let play_for = Ticks::from_ms(duration_ms.min(u64::from(u32::MAX)) as u32);

        let effect = EffectBuilder::new()
            .add_effect(BaseEffect {
                kind: BaseEffectType::Strong {
                    magnitude: magnitude(strong),
                },
                scheduling: Replay {
                    play_for,
                    ..Replay::default()
                },
                ..BaseEffect::default()
            })
            .add_effect(BaseEffect {
                kind: BaseEffectType::Weak {
                    magnitude: magnitude(weak),
                },
                scheduling: Replay {
                    play_for,
                    ..Replay::default()
                },
                ..BaseEffect::default()
            })
            .repeat(Repeat::For(play_for))
            .gamepads(&[id])
            .finish(&mut self.gilrs);

        match effect {
            Ok(effect) => {
                if let Err(e) = effect.play() {
                    warn!("Failed to play rumble effect: {}", e);
                }
                self.active_effect = Some(effect);
            }
            Err(e) => warn!("Failed to build rumble effect: {}", e),
        }
    }

    fn stop_vibration(&mut self) {
        if self.active_effect.take().is_some() {
            debug!("Stopped rumble effect");
        }
    }
}
