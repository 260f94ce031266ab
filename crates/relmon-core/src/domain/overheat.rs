//! Overheat mitigation attribute reading
//!
//! The overheat-mitigation driver announces a thermal event via uevent but
//! exposes the interesting magnitudes as integer sysfs attributes next to
//! its node. The kernel driver debounces before emitting, so every uevent
//! corresponds to exactly one report and no local duration tracking is
//! needed.

use std::path::Path;

use tracing::debug;

/// Temperature and timing attributes of one overheat event
///
/// Temperatures are in deci-degrees Celsius, times in milliseconds, as
/// exposed by the driver. Attributes the driver did not populate read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverheatReading {
    /// Temperature at plug-in
    pub plug_temperature_deci_c: i32,
    /// Maximum temperature seen during the event
    pub max_temperature_deci_c: i32,
    /// Time from plug-in to the overheat trip
    pub time_to_overheat_millis: i64,
    /// Time from the trip to dropping below the hysteresis threshold
    pub time_to_hysteresis_millis: i64,
    /// Time from the trip to mitigation becoming inactive
    pub time_to_inactive_millis: i64,
}

impl OverheatReading {
    /// Reads the driver attributes under `root`.
    ///
    /// Unreadable or unparsable attributes default to 0 with a debug log;
    /// a partially populated node still yields a reading, since the event
    /// itself is the reliability signal.
    pub fn read_from(root: &Path) -> Self {
        Self {
            plug_temperature_deci_c: read_int(&root.join("plug_temp")),
            max_temperature_deci_c: read_int(&root.join("max_temp")),
            time_to_overheat_millis: read_int(&root.join("trip_time")),
            time_to_hysteresis_millis: read_int(&root.join("hysteresis_time")),
            time_to_inactive_millis: read_int(&root.join("cleared_time")),
        }
    }
}

/// Reads a whole-file integer attribute, defaulting to 0.
fn read_int<T>(path: &Path) -> T
where
    T: std::str::FromStr + Default,
{
    match std::fs::read_to_string(path) {
        Ok(content) => match content.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                debug!(path = %path.display(), content = %content.trim(), "Unparsable sysfs attribute");
                T::default()
            }
        },
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Unreadable sysfs attribute");
            T::default()
        }
    }
}
