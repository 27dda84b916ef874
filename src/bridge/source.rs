//! Snapshot source abstraction between the sampler and the actual hardware.
//!
//! The sampler never talks to a backend directly; it polls a [`PadSource`]
//! once per tick. Absence of a device is a normal return value, never an
//! error, and every call is non-blocking by contract.

use super::messages::LinkState;

/// One button's raw sample: digital flag plus analog value in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ButtonSample {
    pub pressed: bool,
    pub value: f32,
}

/// One tick's complete read of controller state. Ephemeral; rebuilt every
/// poll and owned by the sampler for the duration of one comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct PadSnapshot {
    pub index: usize,
    pub id: String,
    pub mapping: String,
    pub can_vibrate: bool,
    pub timestamp: f64,
    pub buttons: Vec<ButtonSample>,
    pub axes: Vec<f32>,
}

/// Errors raised while opening a snapshot backend.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to initialize input backend: {0}")]
    InitializationError(String),
}

/// Non-blocking controller access, polled by the sampler.
pub trait PadSource: Send {
    /// Read the current snapshot of the first connected device, or `None`
    /// when no device is present.
    fn poll(&mut self) -> Option<PadSnapshot>;

    /// Next pending hardware attach/detach signal, if any.
    fn next_link_event(&mut self) -> Option<LinkState>;

    /// Play one dual-channel rumble. Silent no-op without capability.
    fn vibrate(&mut self, duration_ms: u64, strong: f32, weak: f32);

    /// Cancel any running rumble. Silent no-op without capability.
    fn stop_vibration(&mut self);
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted source for sampler and bridge tests.

    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq)]
    pub enum RumbleCall {
        Once { duration: u64, strong: f32, weak: f32 },
        Stop,
    }

    #[derive(Default)]
    pub struct ScriptedSource {
        pub snapshots: VecDeque<Option<PadSnapshot>>,
        // Shared so a test can inject attach/detach signals between ticks.
        pub link_events: std::sync::Arc<std::sync::Mutex<VecDeque<LinkState>>>,
        pub rumble_calls: std::sync::Arc<std::sync::Mutex<Vec<RumbleCall>>>,
    }

    impl ScriptedSource {
        pub fn new(snapshots: Vec<Option<PadSnapshot>>) -> Self {
            Self {
                snapshots: snapshots.into(),
                ..Default::default()
            }
        }
    }

    impl PadSource for ScriptedSource {
        fn poll(&mut self) -> Option<PadSnapshot> {
            // Once the script runs out, stay on the last scripted state.
            match self.snapshots.len() {
                0 => None,
                1 => self.snapshots.front().cloned().flatten(),
                _ => self.snapshots.pop_front().flatten(),
            }
        }

        fn next_link_event(&mut self) -> Option<LinkState> {
            self.link_events.lock().unwrap().pop_front()
        }

        fn vibrate(&mut self, duration_ms: u64, strong: f32, weak: f32) {
            self.rumble_calls.lock().unwrap().push(RumbleCall::Once {
                duration: duration_ms,
                strong,
                weak,
            });
        }

        fn stop_vibration(&mut self) {
            self.rumble_calls.lock().unwrap().push(RumbleCall::Stop);
        }
    }

    /// Snapshot of a standard pad with every control idle.
    pub fn idle_snapshot() -> PadSnapshot {
        PadSnapshot {
            index: 0,
            id: "Test Pad (Vendor: 045e Product: 028e)".to_string(),
            mapping: "standard".to_string(),
            can_vibrate: true,
            timestamp: 0.0,
            buttons: vec![ButtonSample::default(); 17],
            axes: vec![0.0; 4],
        }
    }
}
