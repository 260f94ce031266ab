//! Telemetry record types
//!
//! A [`TelemetryRecord`] is the structured event handed to the statistics
//! backend: one tagged variant per backend schema record, each carrying only
//! the fields that schema requires, plus a no-op variant for discarded
//! messages. Records are ephemeral and never outlive one dispatch call.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::overheat::OverheatReading;

/// One structured reliability event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryRecord {
    /// USB-C connector attach or detach
    UsbConnectorEvent {
        attached: bool,
        /// Type-C mode; present on attach only
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
        /// Connection duration; present on detach only
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_millis: Option<i64>,
    },
    /// USB audio accessory attach or detach
    UsbAudioEvent {
        attached: bool,
        product: String,
        /// Attachment duration; present on detach only
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_millis: Option<i64>,
    },
    /// Microphone health classification
    MicBrokenOrDegradedEvent { mic: u8, is_broken: bool },
    /// USB port overheat mitigation event
    UsbOverheatEvent {
        plug_temperature_deci_c: i32,
        max_temperature_deci_c: i32,
        time_to_overheat_millis: i64,
        time_to_hysteresis_millis: i64,
        time_to_inactive_millis: i64,
    },
    /// Message discarded before reporting; never delivered
    Discarded,
}

impl TelemetryRecord {
    /// Connector attach event carrying the reported mode.
    pub fn connector_connected(mode: impl Into<String>) -> Self {
        TelemetryRecord::UsbConnectorEvent {
            attached: true,
            mode: Some(mode.into()),
            duration_millis: None,
        }
    }

    /// Connector detach event carrying the connection duration.
    pub fn connector_disconnected(duration: Duration) -> Self {
        TelemetryRecord::UsbConnectorEvent {
            attached: false,
            mode: None,
            duration_millis: Some(duration.num_milliseconds()),
        }
    }

    /// Audio accessory attach event.
    pub fn audio_attached(product: impl Into<String>) -> Self {
        TelemetryRecord::UsbAudioEvent {
            attached: true,
            product: product.into(),
            duration_millis: None,
        }
    }

    /// Audio accessory detach event carrying the attachment duration.
    pub fn audio_detached(product: impl Into<String>, duration: Duration) -> Self {
        TelemetryRecord::UsbAudioEvent {
            attached: false,
            product: product.into(),
            duration_millis: Some(duration.num_milliseconds()),
        }
    }

    /// Microphone health event.
    pub fn mic_broken_or_degraded(mic: u8, is_broken: bool) -> Self {
        TelemetryRecord::MicBrokenOrDegradedEvent { mic, is_broken }
    }

    /// Overheat mitigation event from a driver attribute reading.
    pub fn usb_overheat(reading: &OverheatReading) -> Self {
        TelemetryRecord::UsbOverheatEvent {
            plug_temperature_deci_c: reading.plug_temperature_deci_c,
            max_temperature_deci_c: reading.max_temperature_deci_c,
            time_to_overheat_millis: reading.time_to_overheat_millis,
            time_to_hysteresis_millis: reading.time_to_hysteresis_millis,
            time_to_inactive_millis: reading.time_to_inactive_millis,
        }
    }

    /// Returns true for the no-op variant.
    pub fn is_discarded(&self) -> bool {
        matches!(self, TelemetryRecord::Discarded)
    }
}
