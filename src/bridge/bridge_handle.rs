//! Bridge handle - unified API for the gamepad bridge.
//!
//! Wires the sampler and dispatcher tasks together with the serialized
//! message channel, the enabled gate, and the reverse vibration channel,
//! and exposes the host-facing surface: view subscription, enable toggle,
//! and clamped vibration commands.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

pub use super::dispatcher::{DispatcherError, DispatcherHandle, EventHooks, GamepadView};
pub use super::sampler::{SamplerError, SamplerHandle, SamplerSettings};
use super::messages::VibrationCommand;
use super::source::{PadSource, SourceError};

/// Configuration for the complete bridge
#[derive(Clone, Debug)]
pub struct BridgeSettings {
    /// Gates all polling and emission. Disabling stops tick scheduling and
    /// immediately clears the view model.
    pub enabled: bool,
    /// Deadzone radius for stick axes.
    pub axis_threshold: f32,
    /// Frame-tick period in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            axis_threshold: super::diff::DEFAULT_AXIS_THRESHOLD,
            poll_interval_ms: 16,
        }
    }
}

/// Bridge errors
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Source error: {0}")]
    SourceError(#[from] SourceError),

    #[error("Sampler error: {0}")]
    SamplerError(#[from] SamplerError),

    #[error("Dispatcher error: {0}")]
    DispatcherError(#[from] DispatcherError),
}

/// Handle for the running bridge: sampler task + dispatcher task joined by
/// an ordered channel of serialized messages.
pub struct BridgeHandle {
    view_receiver: watch::Receiver<GamepadView>,
    enabled_sender: watch::Sender<bool>,
    command_sender: watch::Sender<Option<VibrationCommand>>,
    vibration_nonce: AtomicU64,
}

impl BridgeHandle {
    /// Spawn both tasks and return the host-facing handle.
    pub fn spawn(
        settings: Option<BridgeSettings>,
        source: Box<dyn PadSource>,
        hooks: EventHooks,
    ) -> Result<Self, BridgeError> {
        let settings = settings.unwrap_or_default();
        info!("Initializing gamepad bridge with settings: {:?}", settings);

        let (message_sender, message_receiver) = mpsc::channel(1024);
        let (enabled_sender, enabled_receiver) = watch::channel(settings.enabled);

        let sampler_settings = SamplerSettings {
            poll_interval_ms: settings.poll_interval_ms,
            axis_threshold: settings.axis_threshold,
        };
        let sampler = SamplerHandle::spawn(
            source,
            Some(sampler_settings),
            message_sender,
            enabled_receiver.clone(),
        )?;
        let command_sender = sampler.command_sender();

        let dispatcher = DispatcherHandle::spawn(message_receiver, hooks, enabled_receiver)?;
        let view_receiver = dispatcher.subscribe();

        info!("Gamepad bridge initialized successfully");
        Ok(Self {
            view_receiver,
            enabled_sender,
            command_sender,
            vibration_nonce: AtomicU64::new(0),
        })
    }

    /// Receiver for the reactive view model.
    pub fn subscribe(&self) -> watch::Receiver<GamepadView> {
        self.view_receiver.clone()
    }

    /// Toggle polling. Disabling stops scheduling new ticks (an in-flight
    /// tick still completes) and clears the view model immediately.
    pub fn set_enabled(&self, enabled: bool) {
        debug!(enabled, "Toggling bridge");
        if self.enabled_sender.send(enabled).is_err() {
            warn!("Bridge tasks are gone, enable toggle ignored");
        }
    }

    /// Vibrate once with equal strong/weak channels.
    pub fn vibrate(&self, duration_ms: u64, strength: f32) {
        self.vibrate_dual(duration_ms, strength, strength);
    }

    /// Vibrate once with separate strong/weak channels. Intensities are
    /// clamped into `[0, 1]`; a non-capable device makes this a no-op on
    /// the receiving side.
    pub fn vibrate_dual(&self, duration_ms: u64, strong: f32, weak: f32) {
        let command = VibrationCommand::Once {
            duration: duration_ms,
            strong: strong.clamp(0.0, 1.0),
            weak: weak.clamp(0.0, 1.0),
            nonce: self.next_nonce(),
        };
        self.send_command(command);
    }

    /// Cancel any running vibration.
    pub fn stop_vibration(&self) {
        let command = VibrationCommand::Stop {
            nonce: self.next_nonce(),
        };
        self.send_command(command);
    }

    fn next_nonce(&self) -> u64 {
        self.vibration_nonce.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn send_command(&self, command: VibrationCommand) {
        // Single-slot channel: an unread older command is overwritten, so
        // the sampler only ever sees the newest one.
        if self.command_sender.send(Some(command)).is_err() {
            warn!("Vibration command not delivered, sampler task is gone");
        }
    }
}
