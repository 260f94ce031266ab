//! Statistics service client
//!
//! Wraps `reqwest::Client` with the submission endpoint and the JSON
//! envelope the collection service ingests. One telemetry record becomes
//! one POST; there is no batching and no retry. A rejected or undelivered
//! record is the caller's to drop.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::trace;
use uuid::Uuid;

use relmon_core::domain::overheat::OverheatReading;
use relmon_core::domain::telemetry::TelemetryRecord;
use relmon_core::ports::IStatsReporter;

/// Submission path relative to the service base URL.
const SUBMIT_PATH: &str = "/v1/reliability-events";

/// Wire envelope around one telemetry record
///
/// Carries the identity and provenance fields the backend needs for
/// deduplication; the record itself is flattened alongside them.
#[derive(Debug, Serialize)]
struct EventEnvelope<'a> {
    /// Unique id for this submission
    id: String,
    /// Submission time, RFC 3339
    timestamp: String,
    /// Reporting agent version
    version: &'static str,
    #[serde(flatten)]
    record: &'a TelemetryRecord,
}

impl<'a> EventEnvelope<'a> {
    fn wrap(record: &'a TelemetryRecord) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            record,
        }
    }
}

/// HTTP client for the statistics-collection service
pub struct StatsClient {
    client: Client,
    base_url: String,
}

impl StatsClient {
    /// Creates a client for the service at `base_url` with a per-request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Fails only if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for stats reporting")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// POSTs one record to the submission endpoint.
    async fn submit(&self, record: &TelemetryRecord) -> Result<()> {
        let envelope = EventEnvelope::wrap(record);
        let url = format!("{}{}", self.base_url, SUBMIT_PATH);

        let response = self
            .client
            .post(&url)
            .json(&envelope)
            .send()
            .await
            .context("Failed to deliver telemetry record")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Stats service rejected record: {status}");
        }

        trace!(id = %envelope.id, "Telemetry record delivered");
        Ok(())
    }
}

#[async_trait]
impl IStatsReporter for StatsClient {
    async fn report_usb_connector(
        &self,
        attached: bool,
        mode: Option<&str>,
        duration_millis: Option<i64>,
    ) -> Result<()> {
        self.submit(&TelemetryRecord::UsbConnectorEvent {
            attached,
            mode: mode.map(str::to_string),
            duration_millis,
        })
        .await
    }

    async fn report_usb_audio(
        &self,
        attached: bool,
        product: &str,
        duration_millis: Option<i64>,
    ) -> Result<()> {
        self.submit(&TelemetryRecord::UsbAudioEvent {
            attached,
            product: product.to_string(),
            duration_millis,
        })
        .await
    }

    async fn report_mic_broken_or_degraded(&self, mic: u8, is_broken: bool) -> Result<()> {
        self.submit(&TelemetryRecord::MicBrokenOrDegradedEvent { mic, is_broken })
            .await
    }

    async fn report_usb_overheat(&self, reading: &OverheatReading) -> Result<()> {
        self.submit(&TelemetryRecord::usb_overheat(reading)).await
    }
}
