//! Uevent classification
//!
//! Routes a parsed uevent to one of the four reliability families or
//! discards it. Classification only decides which family a message belongs
//! to; decoding the family's required values (and rejecting unusable ones)
//! happens in the dispatch path.

use std::path::Path;

use crate::config::ListenerConfig;

use super::audio::AUDIO_DRIVER;
use super::connector::TYPEC_MODE_FIELD;
use super::mic::{MIC_BREAK_FIELD, MIC_DEGRADE_FIELD};
use super::uevent::Uevent;

/// Devpath fragment identifying power-supply class uevents.
const POWER_SUPPLY_PATH_FRAGMENT: &str = "/power_supply/";

/// Event family a uevent was routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// USB-C connector mode change
    Connector,
    /// USB audio accessory hot-plug
    Audio,
    /// Microphone health marker
    Mic,
    /// USB overheat mitigation event
    Overheat,
    /// Not a reliability event; no report, no state mutation
    Ignored,
}

/// Pure classifier over (device path, field map)
///
/// The two matched paths are fixed at construction and never re-read.
#[derive(Debug, Clone)]
pub struct Classifier {
    audio_uevent_devpath: String,
    overheat_devpath: String,
}

impl Classifier {
    /// Builds a classifier from the listener configuration.
    pub fn new(config: &ListenerConfig) -> Self {
        Self {
            audio_uevent_devpath: config.audio_uevent_devpath.clone(),
            overheat_devpath: path_to_string(&config.overheat_sysfs_root),
        }
    }

    /// Classifies one parsed uevent.
    ///
    /// Families are checked in a fixed order; the first match wins.
    /// Unmatched combinations classify as [`Candidate::Ignored`].
    pub fn classify(&self, event: &Uevent) -> Candidate {
        if self.is_connector(event) {
            Candidate::Connector
        } else if self.is_audio(event) {
            Candidate::Audio
        } else if self.is_mic(event) {
            Candidate::Mic
        } else if self.is_overheat(event) {
            Candidate::Overheat
        } else {
            Candidate::Ignored
        }
    }

    fn is_connector(&self, event: &Uevent) -> bool {
        event.devpath().contains(POWER_SUPPLY_PATH_FRAGMENT)
            && event.has_field(TYPEC_MODE_FIELD)
    }

    fn is_audio(&self, event: &Uevent) -> bool {
        event.field("DRIVER") == Some(AUDIO_DRIVER)
            && event.has_field("PRODUCT")
            && matches!(event.field("ACTION"), Some("add" | "remove" | "change"))
    }

    fn is_mic(&self, event: &Uevent) -> bool {
        event.devpath() == self.audio_uevent_devpath
            && (event.has_field(MIC_BREAK_FIELD) || event.has_field(MIC_DEGRADE_FIELD))
    }

    fn is_overheat(&self, event: &Uevent) -> bool {
        event.devpath() == self.overheat_devpath && event.has_field("DRIVER")
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
