//! Microphone health decoding
//!
//! Mic status uevents carry per-microphone health markers on the audio
//! uevent node: `MIC_BREAK_STATUS` flags broken mics, `MIC_DEGRADE_STATUS`
//! flags degraded ones. Each field value is a comma-separated boolean list
//! indexed by mic (`true,false` means mic 0 only; a bare `true` is mic 0).
//!
//! Decoding is stateless per message and every qualifying marker produces
//! its own report; deduplication, if needed, is the backend's job.

use super::uevent::Uevent;

/// Field flagging broken microphones.
pub const MIC_BREAK_FIELD: &str = "MIC_BREAK_STATUS";

/// Field flagging degraded microphones.
pub const MIC_DEGRADE_FIELD: &str = "MIC_DEGRADE_STATUS";

/// The reference hardware carries two microphones, indices 0 and 1.
const MIC_COUNT: usize = 2;

/// Health classification for one microphone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicHealth {
    /// Microphone index (0 or 1)
    pub mic: u8,
    /// True for broken, false for degraded
    pub is_broken: bool,
}

/// Decodes every mic health marker present in `event`.
///
/// Both status fields are examined independently, so one buffer can report
/// a broken mic and a degraded one at the same time. Flags beyond the known
/// mic count are ignored. An event carrying a status field with no `true`
/// flag decodes to an empty list.
pub fn decode(event: &Uevent) -> Vec<MicHealth> {
    let mut out = Vec::new();

    for (field, is_broken) in [(MIC_BREAK_FIELD, true), (MIC_DEGRADE_FIELD, false)] {
        let Some(value) = event.field(field) else {
            continue;
        };
        for (index, flag) in value.split(',').take(MIC_COUNT).enumerate() {
            if flag.trim() == "true" {
                out.push(MicHealth {
                    mic: index as u8,
                    is_broken,
                });
            }
        }
    }

    out
}
