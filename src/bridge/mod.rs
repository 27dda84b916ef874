//! Gamepad bridge: polling, normalization, and host-side dispatch.
//!
//! Implements a two-stage pipeline:
//!
//! 1. [`sampler`] - per-frame snapshot polling and diffing
//! 2. [`dispatcher`] - message decoding and view-model folding
//! 3. [`bridge_handle`] - unified API and lifecycle management
//!
//! # Architecture
//!
//! ```text
//! PadSource ──► Sampler ──► Dispatcher ──► GamepadView
//!               (diff)      (fold)         (watch channel)
//! ```
//!
//! The stages run as separate tasks joined by an ordered channel of
//! serialized messages; vibration commands travel the reverse direction.

pub mod bridge_handle;
pub mod diff;
pub mod dispatcher;
pub mod gilrs_source;
pub mod info;
pub mod messages;
pub mod names;
pub mod sampler;
pub mod source;

pub use bridge_handle::{BridgeError, BridgeHandle, BridgeSettings};
pub use dispatcher::{EventHooks, GamepadView};
pub use gilrs_source::GilrsSource;
pub use messages::{GamepadInfo, GamepadMessage};
pub use source::{PadSnapshot, PadSource};
