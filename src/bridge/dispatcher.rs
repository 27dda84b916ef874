//! Host dispatcher: decodes inbound JSON text, routes typed callbacks, and
//! folds every message into the view model published over a watch channel.
//!
//! Messages are processed strictly in arrival order; the reducer is the
//! only writer of the view model. Undecodable text is dropped silently
//! because the boundary is best-effort and higher layers tolerate missed
//! ticks.

use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use super::messages::{
    AxisMsg, ButtonMsg, DpadMsg, GamepadInfo, GamepadMessage, LinkState, StateMsg, StatusMsg,
};
use super::names::AXIS_NAMES;

/// Reactive view model derived solely from the event stream.
#[derive(Clone, Debug, PartialEq)]
pub struct GamepadView {
    pub connected: bool,
    pub pressed: HashSet<String>,
    pub button_values: HashMap<String, f32>,
    pub axes: HashMap<String, f32>,
    pub info: GamepadInfo,
}

impl Default for GamepadView {
    fn default() -> Self {
        Self {
            connected: false,
            pressed: HashSet::new(),
            button_values: HashMap::new(),
            axes: AXIS_NAMES.iter().map(|n| (n.to_string(), 0.0)).collect(),
            info: GamepadInfo::default(),
        }
    }
}

impl GamepadView {
    pub fn is_pressed(&self, name: &str) -> bool {
        self.pressed.contains(name)
    }
}

/// Typed callbacks invoked per decoded message, before the view update is
/// published. All optional; a hookless dispatcher still maintains the view.
#[derive(Default)]
pub struct EventHooks {
    pub on_button: Option<Box<dyn Fn(&ButtonMsg) + Send>>,
    pub on_axis: Option<Box<dyn Fn(&AxisMsg) + Send>>,
    pub on_dpad: Option<Box<dyn Fn(&DpadMsg) + Send>>,
    pub on_status: Option<Box<dyn Fn(&StatusMsg) + Send>>,
    pub on_info: Option<Box<dyn Fn(&GamepadInfo) + Send>>,
    pub on_state: Option<Box<dyn Fn(&StateMsg) + Send>>,
}

/// Dispatcher errors
#[derive(Debug, thiserror::Error)]
pub enum DispatcherError {
    #[error("Message channel closed: {0}")]
    ChannelClosed(String),
}

/// Fold one message into the view model. Pure single-writer reducer; the
/// overlay and any other consumer only ever read the published copies.
pub fn fold_message(view: &mut GamepadView, message: &GamepadMessage) {
    match message {
        GamepadMessage::Button(b) => {
            if b.pressed {
                view.pressed.insert(b.button.clone());
            } else {
                view.pressed.remove(&b.button);
            }
            view.button_values.insert(b.button.clone(), b.value);
        }
        GamepadMessage::Axis(a) => {
            view.axes.insert(a.axis.clone(), a.value);
        }
        GamepadMessage::Dpad(_) => {
            // Legacy companion only; the button message already updated the view.
        }
        GamepadMessage::Status(s) => {
            if s.state == LinkState::Disconnected {
                view.connected = false;
                view.info.connected = false;
            }
        }
        GamepadMessage::Info(i) => {
            view.connected = i.connected;
            view.info = i.clone();
        }
        GamepadMessage::State(_) => {
            // Convenience snapshot for polling-style consumers; the diffs
            // folded above already brought the view up to date.
        }
    }
}

/// Decode one wire string, or `None` for transport noise.
pub fn decode_message(raw: &str) -> Option<GamepadMessage> {
    match serde_json::from_str(raw) {
        Ok(message) => Some(message),
        Err(e) => {
            debug!("Dropping undecodable message: {}", e);
            None
        }
    }
}

struct Dispatcher {
    message_receiver: mpsc::Receiver<String>,
    hooks: EventHooks,
    view: GamepadView,
    view_sender: watch::Sender<GamepadView>,
    enabled: watch::Receiver<bool>,
}

impl Dispatcher {
    fn run_hooks(&self, message: &GamepadMessage) {
        match message {
            GamepadMessage::Button(b) => {
                if let Some(hook) = &self.hooks.on_button {
                    hook(b);
                }
            }
            GamepadMessage::Axis(a) => {
                if let Some(hook) = &self.hooks.on_axis {
                    hook(a);
                }
            }
            GamepadMessage::Dpad(d) => {
                if let Some(hook) = &self.hooks.on_dpad {
                    hook(d);
                }
            }
            GamepadMessage::Status(s) => {
                if let Some(hook) = &self.hooks.on_status {
                    hook(s);
                }
            }
            GamepadMessage::Info(i) => {
                if let Some(hook) = &self.hooks.on_info {
                    hook(i);
                }
            }
            GamepadMessage::State(s) => {
                if let Some(hook) = &self.hooks.on_state {
                    hook(s);
                }
            }
        }
    }

    fn publish(&self) {
        // Receivers may come and go; a send into the void is fine.
        let _ = self.view_sender.send(self.view.clone());
    }

    /// Clear all view-model state immediately. Polling has stopped, so
    /// waiting for the next tick would leave stale pressed state visible.
    fn clear_view(&mut self) {
        info!("Bridge disabled, clearing view model");
        self.view = GamepadView::default();
        self.publish();
    }

    async fn run(mut self) -> Result<(), DispatcherError> {
        loop {
            tokio::select! {
                raw = self.message_receiver.recv() => {
                    let raw = raw.ok_or_else(|| {
                        DispatcherError::ChannelClosed("sampler side dropped".to_string())
                    })?;
                    if let Some(message) = decode_message(&raw) {
                        self.run_hooks(&message);
                        fold_message(&mut self.view, &message);
                        self.publish();
                    }
                }
                changed = self.enabled.changed() => {
                    if changed.is_err() {
                        return Err(DispatcherError::ChannelClosed(
                            "enabled flag dropped".to_string(),
                        ));
                    }
                    let enabled = *self.enabled.borrow();
                    if !enabled {
                        self.clear_view();
                    }
                }
            }
        }
    }
}

/// Public interface for spawning the dispatcher task
pub struct DispatcherHandle {
    view_receiver: watch::Receiver<GamepadView>,
}

impl DispatcherHandle {
    pub fn spawn(
        message_receiver: mpsc::Receiver<String>,
        hooks: EventHooks,
        enabled: watch::Receiver<bool>,
    ) -> Result<Self, DispatcherError> {
        let view = GamepadView::default();
        let (view_sender, view_receiver) = watch::channel(view.clone());

        let dispatcher = Dispatcher {
            message_receiver,
            hooks,
            view,
            view_sender,
            enabled,
        };

        info!("Spawning dispatcher task");
        tokio::spawn(async move {
            if let Err(e) = dispatcher.run().await {
                error!("Dispatcher task terminated: {}", e);
            }
        });

        Ok(Self { view_receiver })
    }

    /// Receiver for the reactive view model.
    pub fn subscribe(&self) -> watch::Receiver<GamepadView> {
        self.view_receiver.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::messages::DpadKey;

    #[test]
    fn button_messages_update_pressed_set_and_values() {
        let mut view = GamepadView::default();
        fold_message(
            &mut view,
            &GamepadMessage::Button(ButtonMsg {
                button: "a".into(),
                index: 0,
                pressed: true,
                value: 1.0,
            }),
        );
        assert!(view.is_pressed("a"));
        assert_eq!(view.button_values.get("a"), Some(&1.0));

        fold_message(
            &mut view,
            &GamepadMessage::Button(ButtonMsg {
                button: "a".into(),
                index: 0,
                pressed: false,
                value: 0.0,
            }),
        );
        assert!(!view.is_pressed("a"));
        assert_eq!(view.button_values.get("a"), Some(&0.0));
    }

    #[test]
    fn axis_messages_overwrite_the_axis_map() {
        let mut view = GamepadView::default();
        assert_eq!(view.axes.get("leftX"), Some(&0.0));
        fold_message(
            &mut view,
            &GamepadMessage::Axis(AxisMsg {
                axis: "leftX".into(),
                index: 0,
                value: -0.6,
            }),
        );
        assert_eq!(view.axes.get("leftX"), Some(&-0.6));
    }

    #[test]
    fn info_and_status_drive_the_connected_flag() {
        let mut view = GamepadView::default();
        let info = GamepadInfo {
            connected: true,
            ..GamepadInfo::default()
        };
        fold_message(&mut view, &GamepadMessage::Info(info));
        assert!(view.connected);

        fold_message(
            &mut view,
            &GamepadMessage::Status(StatusMsg {
                state: LinkState::Disconnected,
            }),
        );
        assert!(!view.connected);
        assert!(!view.info.connected);
    }

    #[test]
    fn dpad_messages_leave_the_view_untouched() {
        let mut view = GamepadView::default();
        let before = view.clone();
        fold_message(
            &mut view,
            &GamepadMessage::Dpad(DpadMsg {
                key: DpadKey::Up,
                pressed: true,
            }),
        );
        assert_eq!(view, before);
    }

    #[test]
    fn transport_noise_decodes_to_none() {
        assert!(decode_message("not json at all").is_none());
        assert!(decode_message(r#"{"type":"mystery"}"#).is_none());
        assert!(decode_message(r#"{"type":"dpad","key":"up","pressed":true}"#).is_some());
    }

    #[tokio::test]
    async fn dispatcher_publishes_folded_views_and_drops_noise() {
        let (tx, rx) = mpsc::channel(16);
        let (_enabled_tx, enabled_rx) = watch::channel(true);
        let handle = DispatcherHandle::spawn(rx, EventHooks::default(), enabled_rx).unwrap();
        let mut view_rx = handle.subscribe();

        tx.send("garbage".to_string()).await.unwrap();
        tx.send(
            r#"{"type":"button","button":"x","index":2,"pressed":true,"value":1.0}"#.to_string(),
        )
        .await
        .unwrap();

        view_rx.changed().await.unwrap();
        let view = view_rx.borrow().clone();
        assert!(view.is_pressed("x"));
    }

    #[tokio::test]
    async fn disabling_clears_the_view_without_new_messages() {
        let (tx, rx) = mpsc::channel(16);
        let (enabled_tx, enabled_rx) = watch::channel(true);
        let handle = DispatcherHandle::spawn(rx, EventHooks::default(), enabled_rx).unwrap();
        let mut view_rx = handle.subscribe();

        tx.send(
            r#"{"type":"button","button":"b","index":1,"pressed":true,"value":1.0}"#.to_string(),
        )
        .await
        .unwrap();
        view_rx.changed().await.unwrap();
        assert!(view_rx.borrow().is_pressed("b"));

        enabled_tx.send(false).unwrap();
        view_rx.changed().await.unwrap();
        let cleared = view_rx.borrow().clone();
        assert!(cleared.pressed.is_empty());
        assert!(cleared.button_values.is_empty());
        assert!(!cleared.connected);
        assert_eq!(cleared.axes.get("leftX"), Some(&0.0));
    }

    #[tokio::test]
    async fn hooks_fire_before_the_view_update() {
        let (tx, rx) = mpsc::channel(16);
        let (_enabled_tx, enabled_rx) = watch::channel(true);
        let (seen_tx, seen_rx) = std::sync::mpsc::channel();
        let hooks = EventHooks {
            on_dpad: Some(Box::new(move |d: &DpadMsg| {
                let _ = seen_tx.send((d.key, d.pressed));
            })),
            ..EventHooks::default()
        };
        let _handle = DispatcherHandle::spawn(rx, hooks, enabled_rx).unwrap();

        tx.send(r#"{"type":"dpad","key":"down","pressed":true}"#.to_string())
            .await
            .unwrap();

        let seen = tokio::task::spawn_blocking(move || {
            seen_rx
                .recv_timeout(std::time::Duration::from_secs(2))
                .unwrap()
        })
        .await
        .unwrap();
        assert_eq!(seen, (DpadKey::Down, true));
    }
}
