//! Sampler task: one snapshot per frame tick, diffed and shipped as JSON.
//!
//! The sampler owns the comparison memory and the reverse vibration channel.
//! Each tick fully completes, including all emissions, before the next one
//! is scheduled; disabling the bridge stops scheduling new ticks rather than
//! interrupting an in-flight one.

use chrono::Local;
use statum::{machine, state};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::diff::{diff_tick, release_stuck_inputs, SamplerMemory, DEFAULT_AXIS_THRESHOLD};
use super::messages::{GamepadMessage, LinkState, StatusMsg, VibrationCommand};
use super::source::PadSource;

/// Sampler settings
#[derive(Clone, Debug)]
pub struct SamplerSettings {
    /// Frame-tick period in milliseconds. 16 ms approximates one display
    /// refresh at 60 Hz.
    pub poll_interval_ms: u64,
    /// Deadzone radius applied to raw axis values before comparison.
    pub axis_threshold: f32,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 16,
            axis_threshold: DEFAULT_AXIS_THRESHOLD,
        }
    }
}

/// Sampler errors
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("Failed to initialize sampler: {0}")]
    InitializationError(String),

    #[error("Message channel closed: {0}")]
    ChannelClosed(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum SamplerPhase {
    Initializing,
    Sampling,
}

#[machine]
pub struct Sampler<S: SamplerPhase> {
    // Snapshot source (hardware backend or test double)
    source: Box<dyn PadSource>,

    // Sampler settings
    settings: SamplerSettings,

    // Last-emitted comparison state, owned exclusively by this task
    memory: SamplerMemory,

    // Outbound serialized messages to the dispatcher
    message_sender: mpsc::Sender<String>,

    // Inbound vibration command slot from the host handle; the watch
    // channel holds only the newest command, older ones are overwritten
    command_receiver: watch::Receiver<Option<VibrationCommand>>,

    // Polling gate; false stops scheduling ticks
    enabled: watch::Receiver<bool>,

    // Highest vibration nonce applied so far
    last_nonce: u64,
}

impl<S: SamplerPhase> Sampler<S> {
    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }
}

impl Sampler<Initializing> {
    pub fn create(
        source: Box<dyn PadSource>,
        settings: Option<SamplerSettings>,
        message_sender: mpsc::Sender<String>,
        command_receiver: watch::Receiver<Option<VibrationCommand>>,
        enabled: watch::Receiver<bool>,
    ) -> Self {
        let settings = settings.unwrap_or_default();
        debug!("Creating sampler with settings: {:?}", settings);
        Self::new(
            source,
            settings,
            SamplerMemory::new(),
            message_sender,
            command_receiver,
            enabled,
            0,
        )
    }

    pub fn initialize(self) -> Sampler<Sampling> {
        info!(
            "Sampler initialized: interval {} ms, deadzone {}",
            self.settings.poll_interval_ms, self.settings.axis_threshold
        );
        self.transition()
    }
}

impl Sampler<Sampling> {
    /// Apply the freshest pending command, if any. The watch slot already
    /// collapsed any burst down to the newest command; the nonce guard
    /// rejects anything not strictly newer than the last applied one.
    fn apply_vibration_commands(&mut self) {
        if !self.command_receiver.has_changed().unwrap_or(false) {
            return;
        }
        let pending = self.command_receiver.borrow_and_update().clone();
        let latest = match pending {
            Some(command) if command.nonce() > self.last_nonce => {
                self.last_nonce = command.nonce();
                Some(command)
            }
            Some(command) => {
                debug!(nonce = command.nonce(), "skipping stale vibration command");
                None
            }
            None => None,
        };

        match latest {
            Some(VibrationCommand::Once {
                duration,
                strong,
                weak,
                nonce,
            }) => {
                debug!(nonce, duration, "applying vibration command");
                self.source.vibrate(duration, strong, weak);
            }
            Some(VibrationCommand::Stop { nonce }) => {
                debug!(nonce, "stopping vibration");
                self.source.stop_vibration();
            }
            None => {}
        }
    }

    /// Turn pending attach/detach signals into status messages. Detach
    /// releases held buttons first so no consumer sees a stuck press.
    fn drain_link_events(&mut self) -> Vec<GamepadMessage> {
        let mut messages = Vec::new();
        while let Some(link) = self.source.next_link_event() {
            match link {
                LinkState::Connected => info!("Controller connected"),
                LinkState::Disconnected => {
                    warn!("Controller disconnected");
                    messages.extend(release_stuck_inputs(&mut self.memory, false));
                }
            }
            messages.push(GamepadMessage::Status(StatusMsg { state: link }));
        }
        messages
    }

    /// One complete tick: commands, link signals, snapshot, diff, emit.
    pub async fn sample_tick(&mut self) -> Result<usize, SamplerError> {
        self.apply_vibration_commands();

        let mut messages = self.drain_link_events();
        let snapshot = self.source.poll();
        messages.extend(diff_tick(
            &mut self.memory,
            snapshot.as_ref(),
            self.settings.axis_threshold,
        ));

        let count = messages.len();
        for message in messages {
            match serde_json::to_string(&message) {
                Ok(json) => {
                    self.message_sender
                        .send(json)
                        .await
                        .map_err(|e| SamplerError::ChannelClosed(e.to_string()))?;
                }
                Err(e) => {
                    // Best-effort boundary: skip what cannot be encoded.
                    error!("Dropping unencodable message: {}", e);
                }
            }
        }
        Ok(count)
    }

    /// Run the cooperative tick loop until the channels close.
    pub async fn run(&mut self) -> Result<(), SamplerError> {
        info!(
            "Starting sampler loop with {} ms interval",
            self.settings.poll_interval_ms
        );
        let mut ticker = tokio::time::interval(std::time::Duration::from_millis(
            self.settings.poll_interval_ms,
        ));

        let mut ticks: u64 = 0;
        let mut emitted: u64 = 0;
        let mut last_stats_time = Local::now();
        let stats_interval = chrono::Duration::seconds(30);

        loop {
            let enabled = *self.enabled.borrow();
            if !enabled {
                debug!("Sampler disabled, waiting for re-enable");
                if self.enabled.changed().await.is_err() {
                    return Err(SamplerError::ChannelClosed(
                        "enabled flag dropped".to_string(),
                    ));
                }
                // Resume with blank comparison memory: the cleared view on
                // the other side must re-learn the device from a fresh info
                // message and full diffs.
                self.memory = SamplerMemory::new();
                ticker.reset();
                continue;
            }

            ticker.tick().await;
            emitted += self.sample_tick().await? as u64;
            ticks += 1;

            let now = Local::now();
            if now - last_stats_time > stats_interval {
                info!(
                    "Sampler stats: {} ticks, {} messages in {} seconds",
                    ticks,
                    emitted,
                    (now - last_stats_time).num_seconds()
                );
                ticks = 0;
                emitted = 0;
                last_stats_time = now;
            }
        }
    }
}

/// Public interface for spawning the sampler task
pub struct SamplerHandle {
    command_sender: watch::Sender<Option<VibrationCommand>>,
}

impl SamplerHandle {
    pub fn spawn(
        source: Box<dyn PadSource>,
        settings: Option<SamplerSettings>,
        message_sender: mpsc::Sender<String>,
        enabled: watch::Receiver<bool>,
    ) -> Result<Self, SamplerError> {
        info!("Spawning sampler with settings: {:?}", settings);
        let (command_sender, command_receiver) = watch::channel(None);

        let sampler = Sampler::create(source, settings, message_sender, command_receiver, enabled);

        tokio::spawn(async move {
            let mut sampling = sampler.initialize();
            if let Err(e) = sampling.run().await {
                error!("Sampler task terminated: {}", e);
            }
        });

        Ok(Self { command_sender })
    }

    /// Sender for the reverse vibration slot.
    pub fn command_sender(&self) -> watch::Sender<Option<VibrationCommand>> {
        self.command_sender.clone()
    }
}
