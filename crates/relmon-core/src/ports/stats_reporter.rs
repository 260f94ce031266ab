//! Stats reporter port (driven/secondary port)
//!
//! This module defines the narrow reporting contract toward the external
//! statistics-collection service: one method per telemetry variant, each
//! accepting the concrete fields its backend schema requires.
//!
//! ## Design Notes
//!
//! - Delivery is fire-and-forget from the core's point of view: a failed
//!   call is logged and dropped, never retried, and never blocks the
//!   listener loop or influences state transitions.
//! - Implementations should return `Err` rather than panic on delivery
//!   problems; the caller owns the logging.

use async_trait::async_trait;

use crate::domain::overheat::OverheatReading;

/// Port trait for forwarding reliability events
#[async_trait]
pub trait IStatsReporter: Send + Sync {
    /// Reports a USB-C connector attach (`duration_millis` absent) or
    /// detach (`mode` absent, duration present).
    async fn report_usb_connector(
        &self,
        attached: bool,
        mode: Option<&str>,
        duration_millis: Option<i64>,
    ) -> anyhow::Result<()>;

    /// Reports a USB audio accessory attach or detach.
    async fn report_usb_audio(
        &self,
        attached: bool,
        product: &str,
        duration_millis: Option<i64>,
    ) -> anyhow::Result<()>;

    /// Reports one microphone as broken (`is_broken`) or degraded.
    async fn report_mic_broken_or_degraded(&self, mic: u8, is_broken: bool)
        -> anyhow::Result<()>;

    /// Reports a USB port overheat mitigation event.
    async fn report_usb_overheat(&self, reading: &OverheatReading) -> anyhow::Result<()>;
}
