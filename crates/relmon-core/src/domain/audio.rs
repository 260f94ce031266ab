//! USB audio accessory state machine
//!
//! Tracks the currently attached USB audio device from `snd-usb-audio`
//! uevents. The kernel identifies the device by its `PRODUCT` string
//! (`vid/pid/rev`), which is recorded on `add` and matched on `remove` so
//! the detach duration is attributed to the right device.
//!
//! A `remove` whose product does not match the tracked one means an `add`
//! was missed; no duration is reported for it, but the state resets to
//! `NoDevice` either way so later events never use stale data.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use super::errors::DomainError;

/// DRIVER value identifying the USB audio subsystem.
pub const AUDIO_DRIVER: &str = "snd-usb-audio";

/// Hot-plug action carried by an audio uevent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioAction {
    Add,
    Remove,
    /// Informational only; never changes attach state
    Change,
}

impl FromStr for AudioAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(AudioAction::Add),
            "remove" => Ok(AudioAction::Remove),
            "change" => Ok(AudioAction::Change),
            other => Err(DomainError::UnknownAction(other.to_string())),
        }
    }
}

/// Attach state of the USB audio accessory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AudioAccessoryState {
    /// No audio device tracked
    #[default]
    NoDevice,
    /// An audio device is attached
    Attached {
        /// `PRODUCT` string of the attached device
        product: String,
        /// When the attach was observed
        since: DateTime<Utc>,
    },
}

/// Observable transition produced by an audio action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioTransition {
    /// A device was attached
    Attached { product: String },
    /// The tracked device was detached; carries the attachment duration
    Detached { product: String, duration: Duration },
    /// A detach arrived for a device that was never tracked as attached.
    /// Indicates a missed attach notification; the caller logs this and
    /// reports no duration.
    DetachMismatch {
        /// Product tracked at the time, if any
        tracked: Option<String>,
        /// Product named by the remove event
        product: String,
    },
}

impl AudioAccessoryState {
    /// Returns the tracked product, if a device is attached.
    pub fn product(&self) -> Option<&str> {
        match self {
            AudioAccessoryState::NoDevice => None,
            AudioAccessoryState::Attached { product, .. } => Some(product),
        }
    }

    /// Applies a hot-plug action for `product` observed at `now`.
    ///
    /// Consumes the current state and returns the next state plus the
    /// transition to act on, if any. `Change` never transitions. A second
    /// `add` replaces the tracked device and still reports an attach (the
    /// matching remove was missed). A mismatched `remove` resets the state
    /// without producing a duration.
    pub fn on_action(
        self,
        action: AudioAction,
        product: &str,
        now: DateTime<Utc>,
    ) -> (Self, Option<AudioTransition>) {
        match action {
            AudioAction::Add => (
                AudioAccessoryState::Attached {
                    product: product.to_string(),
                    since: now,
                },
                Some(AudioTransition::Attached {
                    product: product.to_string(),
                }),
            ),
            AudioAction::Remove => match self {
                AudioAccessoryState::Attached {
                    product: tracked,
                    since,
                } if tracked == product => (
                    AudioAccessoryState::NoDevice,
                    Some(AudioTransition::Detached {
                        product: tracked,
                        duration: now - since,
                    }),
                ),
                AudioAccessoryState::Attached {
                    product: tracked, ..
                } => (
                    AudioAccessoryState::NoDevice,
                    Some(AudioTransition::DetachMismatch {
                        tracked: Some(tracked),
                        product: product.to_string(),
                    }),
                ),
                AudioAccessoryState::NoDevice => (
                    AudioAccessoryState::NoDevice,
                    Some(AudioTransition::DetachMismatch {
                        tracked: None,
                        product: product.to_string(),
                    }),
                ),
            },
            AudioAction::Change => (self, None),
        }
    }
}
