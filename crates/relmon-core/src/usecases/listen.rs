//! Uevent dispatch loop
//!
//! Orchestrates the full pipeline for one raw buffer: parse → classify →
//! state transition → report. The listener owns the per-subsystem state and
//! is the only code that mutates it; everything observable from outside goes
//! through immutable snapshot accessors.
//!
//! Liveness rule: a single bad message never stops the loop. Malformed
//! input, decode failures, state mismatches, and report-delivery failures
//! are all logged and absorbed; only a transport failure from the event
//! source propagates out.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, trace, warn};

use crate::config::ListenerConfig;
use crate::domain::audio::{AudioAccessoryState, AudioAction, AudioTransition};
use crate::domain::classify::{Candidate, Classifier};
use crate::domain::connector::{ConnectorState, ConnectorTransition, TYPEC_MODE_FIELD};
use crate::domain::mic;
use crate::domain::overheat::OverheatReading;
use crate::domain::telemetry::TelemetryRecord;
use crate::domain::uevent::Uevent;
use crate::ports::{IClock, IStatsReporter, IUeventSource};

/// Result of processing one raw buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// At least one telemetry record was dispatched
    Reported,
    /// The message was valid but not reportable (irrelevant subsystem or
    /// debounced repeat); no state was mutated beyond debouncing
    Ignored,
    /// The message was malformed or a classified family was missing a
    /// required value; nothing was mutated or reported
    Rejected,
}

/// The uevent listener use case
///
/// Holds process-lifetime state for the USB connector and audio accessory
/// subsystems. All mutation happens inside [`UeventListener::process_buffer`];
/// callers embedding this in a multi-threaded host must keep the listener on
/// one task and treat the snapshot accessors as requiring external
/// synchronization if polled from elsewhere.
pub struct UeventListener {
    classifier: Classifier,
    overheat_root: PathBuf,
    source: Arc<dyn IUeventSource>,
    reporter: Arc<dyn IStatsReporter>,
    clock: Arc<dyn IClock>,
    connector: ConnectorState,
    audio: AudioAccessoryState,
}

impl UeventListener {
    /// Creates a listener with "not attached" defaults for all tracked state.
    pub fn new(
        config: &ListenerConfig,
        source: Arc<dyn IUeventSource>,
        reporter: Arc<dyn IStatsReporter>,
        clock: Arc<dyn IClock>,
    ) -> Self {
        Self {
            classifier: Classifier::new(config),
            overheat_root: config.overheat_sysfs_root.clone(),
            source,
            reporter,
            clock,
            connector: ConnectorState::default(),
            audio: AudioAccessoryState::default(),
        }
    }

    // --- Snapshot accessors ---

    /// Returns true if the USB connector is currently tracked as attached.
    pub fn is_usb_attached(&self) -> bool {
        self.connector.is_attached()
    }

    /// Returns the `PRODUCT` string of the currently attached USB audio
    /// device, if any.
    pub fn attached_audio_product(&self) -> Option<String> {
        self.audio.product().map(str::to_string)
    }

    // --- Entry points ---

    /// Processes exactly one buffer pulled from the event source.
    ///
    /// # Errors
    ///
    /// Returns an error only when the transport fails; every per-message
    /// problem is absorbed into the returned [`ProcessOutcome`].
    pub async fn process_one(&mut self) -> Result<ProcessOutcome> {
        let raw = self
            .source
            .next_event()
            .await
            .context("Uevent transport failed")?;
        Ok(self.process_buffer(&raw).await)
    }

    /// Processes buffers until the transport fails.
    ///
    /// This is the daemon mode: the only exit is an unrecoverable transport
    /// error, which is propagated to the host.
    pub async fn listen(&mut self) -> Result<()> {
        loop {
            self.process_one().await?;
        }
    }

    /// Runs the pipeline for one already-delivered buffer.
    pub async fn process_buffer(&mut self, raw: &[u8]) -> ProcessOutcome {
        let event = Uevent::parse(raw);
        if event.is_empty() {
            trace!("Discarding empty uevent buffer");
            return ProcessOutcome::Rejected;
        }

        match self.classifier.classify(&event) {
            Candidate::Connector => self.handle_connector(&event).await,
            Candidate::Audio => self.handle_audio(&event).await,
            Candidate::Mic => self.handle_mic(&event).await,
            Candidate::Overheat => self.handle_overheat(&event).await,
            Candidate::Ignored => {
                trace!(devpath = %event.devpath(), "Uevent not relevant to reliability");
                ProcessOutcome::Ignored
            }
        }
    }

    // --- Per-family dispatch ---

    async fn handle_connector(&mut self, event: &Uevent) -> ProcessOutcome {
        let mode = match event.field(TYPEC_MODE_FIELD) {
            Some(mode) if !mode.is_empty() => mode,
            _ => {
                debug!(devpath = %event.devpath(), "Connector uevent without a usable mode value");
                return ProcessOutcome::Rejected;
            }
        };

        let now = self.clock.now();
        let (next, transition) = std::mem::take(&mut self.connector).on_mode(mode, now);
        self.connector = next;

        match transition {
            Some(ConnectorTransition::Connected { mode }) => {
                debug!(mode = %mode, "USB connector attached");
                self.deliver(TelemetryRecord::connector_connected(mode)).await;
                ProcessOutcome::Reported
            }
            Some(ConnectorTransition::Disconnected { duration }) => {
                debug!(duration_millis = duration.num_milliseconds(), "USB connector detached");
                self.deliver(TelemetryRecord::connector_disconnected(duration))
                    .await;
                ProcessOutcome::Reported
            }
            None => {
                trace!(mode = %mode, "Connector mode repeat debounced");
                ProcessOutcome::Ignored
            }
        }
    }

    async fn handle_audio(&mut self, event: &Uevent) -> ProcessOutcome {
        let (Some(action), Some(product)) = (event.field("ACTION"), event.field("PRODUCT"))
        else {
            debug!(devpath = %event.devpath(), "Audio uevent missing ACTION or PRODUCT");
            return ProcessOutcome::Rejected;
        };
        let action: AudioAction = match action.parse() {
            Ok(action) => action,
            Err(e) => {
                debug!(error = %e, "Audio uevent with undecodable action");
                return ProcessOutcome::Rejected;
            }
        };

        let now = self.clock.now();
        let (next, transition) = std::mem::take(&mut self.audio).on_action(action, product, now);
        self.audio = next;

        match transition {
            Some(AudioTransition::Attached { product }) => {
                debug!(product = %product, "USB audio accessory attached");
                self.deliver(TelemetryRecord::audio_attached(product)).await;
                ProcessOutcome::Reported
            }
            Some(AudioTransition::Detached { product, duration }) => {
                debug!(
                    product = %product,
                    duration_millis = duration.num_milliseconds(),
                    "USB audio accessory detached"
                );
                self.deliver(TelemetryRecord::audio_detached(product, duration))
                    .await;
                ProcessOutcome::Reported
            }
            Some(AudioTransition::DetachMismatch { tracked, product }) => {
                warn!(
                    tracked = tracked.as_deref().unwrap_or("<none>"),
                    product = %product,
                    "Audio remove did not match tracked device; resetting state, skipping duration"
                );
                ProcessOutcome::Ignored
            }
            None => {
                trace!("Audio change uevent is informational only");
                ProcessOutcome::Ignored
            }
        }
    }

    async fn handle_mic(&mut self, event: &Uevent) -> ProcessOutcome {
        let statuses = mic::decode(event);
        if statuses.is_empty() {
            debug!(devpath = %event.devpath(), "Mic status uevent without decodable markers");
            return ProcessOutcome::Rejected;
        }

        for status in statuses {
            debug!(mic = status.mic, is_broken = status.is_broken, "Microphone health event");
            self.deliver(TelemetryRecord::mic_broken_or_degraded(
                status.mic,
                status.is_broken,
            ))
            .await;
        }
        ProcessOutcome::Reported
    }

    async fn handle_overheat(&mut self, event: &Uevent) -> ProcessOutcome {
        let reading = OverheatReading::read_from(&self.overheat_root);
        debug!(
            devpath = %event.devpath(),
            max_temperature_deci_c = reading.max_temperature_deci_c,
            "USB port overheat mitigation event"
        );
        self.deliver(TelemetryRecord::usb_overheat(&reading)).await;
        ProcessOutcome::Reported
    }

    /// Hands one record to the reporter port, fire-and-forget.
    ///
    /// Delivery failures are logged and dropped; they never influence state
    /// or stop the loop.
    async fn deliver(&self, record: TelemetryRecord) {
        let result = match &record {
            TelemetryRecord::UsbConnectorEvent {
                attached,
                mode,
                duration_millis,
            } => {
                self.reporter
                    .report_usb_connector(*attached, mode.as_deref(), *duration_millis)
                    .await
            }
            TelemetryRecord::UsbAudioEvent {
                attached,
                product,
                duration_millis,
            } => {
                self.reporter
                    .report_usb_audio(*attached, product, *duration_millis)
                    .await
            }
            TelemetryRecord::MicBrokenOrDegradedEvent { mic, is_broken } => {
                self.reporter
                    .report_mic_broken_or_degraded(*mic, *is_broken)
                    .await
            }
            TelemetryRecord::UsbOverheatEvent {
                plug_temperature_deci_c,
                max_temperature_deci_c,
                time_to_overheat_millis,
                time_to_hysteresis_millis,
                time_to_inactive_millis,
            } => {
                let reading = OverheatReading {
                    plug_temperature_deci_c: *plug_temperature_deci_c,
                    max_temperature_deci_c: *max_temperature_deci_c,
                    time_to_overheat_millis: *time_to_overheat_millis,
                    time_to_hysteresis_millis: *time_to_hysteresis_millis,
                    time_to_inactive_millis: *time_to_inactive_millis,
                };
                self.reporter.report_usb_overheat(&reading).await
            }
            TelemetryRecord::Discarded => Ok(()),
        };

        if let Err(e) = result {
            warn!(error = format!("{e:#}"), "Dropping undeliverable telemetry record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    use crate::domain::overheat::OverheatReading;

    // --- Test doubles ---

    struct FakeClock(Mutex<DateTime<Utc>>);

    impl FakeClock {
        fn start() -> Arc<Self> {
            Arc::new(Self(Mutex::new(
                DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            )))
        }

        fn advance(&self, duration: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += duration;
        }
    }

    impl IClock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    /// Records every delivered record; optionally fails all deliveries.
    #[derive(Default)]
    struct RecordingReporter {
        records: Mutex<Vec<TelemetryRecord>>,
        fail: AtomicBool,
    }

    impl RecordingReporter {
        fn records(&self) -> Vec<TelemetryRecord> {
            self.records.lock().unwrap().clone()
        }

        fn set_failing(&self, failing: bool) {
            self.fail.store(failing, Ordering::SeqCst);
        }

        fn push(&self, record: TelemetryRecord) -> anyhow::Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("stats service unavailable"));
            }
            self.records.lock().unwrap().push(record);
            Ok(())
        }
    }

    #[async_trait]
    impl IStatsReporter for RecordingReporter {
        async fn report_usb_connector(
            &self,
            attached: bool,
            mode: Option<&str>,
            duration_millis: Option<i64>,
        ) -> anyhow::Result<()> {
            self.push(TelemetryRecord::UsbConnectorEvent {
                attached,
                mode: mode.map(str::to_string),
                duration_millis,
            })
        }

        async fn report_usb_audio(
            &self,
            attached: bool,
            product: &str,
            duration_millis: Option<i64>,
        ) -> anyhow::Result<()> {
            self.push(TelemetryRecord::UsbAudioEvent {
                attached,
                product: product.to_string(),
                duration_millis,
            })
        }

        async fn report_mic_broken_or_degraded(
            &self,
            mic: u8,
            is_broken: bool,
        ) -> anyhow::Result<()> {
            self.push(TelemetryRecord::MicBrokenOrDegradedEvent { mic, is_broken })
        }

        async fn report_usb_overheat(&self, reading: &OverheatReading) -> anyhow::Result<()> {
            self.push(TelemetryRecord::usb_overheat(reading))
        }
    }

    /// Hands out pre-scripted buffers, then fails like a closed channel.
    struct ScriptedSource(Mutex<VecDeque<Vec<u8>>>);

    impl ScriptedSource {
        fn new(buffers: Vec<&[u8]>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(
                buffers.into_iter().map(<[u8]>::to_vec).collect(),
            )))
        }
    }

    #[async_trait]
    impl IUeventSource for ScriptedSource {
        async fn next_event(&self) -> anyhow::Result<Vec<u8>> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow!("uevent channel closed"))
        }
    }

    // --- Harness ---

    fn listener(
        config: &ListenerConfig,
        buffers: Vec<&[u8]>,
    ) -> (UeventListener, Arc<RecordingReporter>, Arc<FakeClock>) {
        let reporter = Arc::new(RecordingReporter::default());
        let clock = FakeClock::start();
        let listener = UeventListener::new(
            config,
            ScriptedSource::new(buffers),
            Arc::clone(&reporter) as Arc<dyn IStatsReporter>,
            Arc::clone(&clock) as Arc<dyn IClock>,
        );
        (listener, reporter, clock)
    }

    const CONNECTOR_ATTACH: &[u8] =
        b"/devices/platform/soc/power_supply/usb\nPOWER_SUPPLY_TYPEC_MODE=DFP";
    const CONNECTOR_DETACH: &[u8] =
        b"/devices/platform/soc/power_supply/usb\nPOWER_SUPPLY_TYPEC_MODE=Nothing attached";

    fn audio_buffer(action: &str, product: &str) -> Vec<u8> {
        format!(
            "/devices/pci0000:00/usb1/1-2\nACTION={action}\nDRIVER=snd-usb-audio\nPRODUCT={product}"
        )
        .into_bytes()
    }

    // --- Connector ---

    #[tokio::test]
    async fn test_connector_duration_matches_clock_delta() {
        let (mut listener, reporter, clock) = listener(&ListenerConfig::default(), vec![]);

        assert_eq!(
            listener.process_buffer(CONNECTOR_ATTACH).await,
            ProcessOutcome::Reported
        );
        assert!(listener.is_usb_attached());

        clock.advance(Duration::seconds(75));
        assert_eq!(
            listener.process_buffer(CONNECTOR_DETACH).await,
            ProcessOutcome::Reported
        );
        assert!(!listener.is_usb_attached());

        assert_eq!(
            reporter.records(),
            vec![
                TelemetryRecord::connector_connected("DFP"),
                TelemetryRecord::connector_disconnected(Duration::seconds(75)),
            ]
        );
    }

    #[tokio::test]
    async fn test_repeated_mode_reports_exactly_once() {
        let (mut listener, reporter, _) = listener(&ListenerConfig::default(), vec![]);

        assert_eq!(
            listener.process_buffer(CONNECTOR_ATTACH).await,
            ProcessOutcome::Reported
        );
        assert_eq!(
            listener.process_buffer(CONNECTOR_ATTACH).await,
            ProcessOutcome::Ignored
        );
        assert_eq!(
            listener.process_buffer(CONNECTOR_ATTACH).await,
            ProcessOutcome::Ignored
        );

        assert_eq!(reporter.records().len(), 1);
    }

    #[tokio::test]
    async fn test_connector_without_usable_mode_is_rejected() {
        let (mut listener, reporter, _) = listener(&ListenerConfig::default(), vec![]);

        let outcome = listener
            .process_buffer(b"/devices/platform/soc/power_supply/usb\nPOWER_SUPPLY_TYPEC_MODE=")
            .await;

        assert_eq!(outcome, ProcessOutcome::Rejected);
        assert!(!listener.is_usb_attached());
        assert!(reporter.records().is_empty());
    }

    // --- Audio accessory ---

    #[tokio::test]
    async fn test_audio_attach_detach_duration() {
        let (mut listener, reporter, clock) = listener(&ListenerConfig::default(), vec![]);

        listener.process_buffer(&audio_buffer("add", "46d/a38/102")).await;
        assert_eq!(
            listener.attached_audio_product(),
            Some("46d/a38/102".to_string())
        );

        clock.advance(Duration::seconds(120));
        listener
            .process_buffer(&audio_buffer("remove", "46d/a38/102"))
            .await;
        assert_eq!(listener.attached_audio_product(), None);

        assert_eq!(
            reporter.records(),
            vec![
                TelemetryRecord::audio_attached("46d/a38/102"),
                TelemetryRecord::audio_detached("46d/a38/102", Duration::seconds(120)),
            ]
        );
    }

    #[tokio::test]
    async fn test_mismatched_remove_skips_duration_and_resets() {
        let (mut listener, reporter, _) = listener(&ListenerConfig::default(), vec![]);

        listener.process_buffer(&audio_buffer("add", "46d/a38/102")).await;
        let outcome = listener
            .process_buffer(&audio_buffer("remove", "bb4/fa2/1"))
            .await;

        assert_eq!(outcome, ProcessOutcome::Ignored);
        assert_eq!(listener.attached_audio_product(), None);
        // only the attach was reported
        assert_eq!(reporter.records().len(), 1);

        // State was reset, not left stale: the same remove again behaves
        // identically instead of producing a duration from old data.
        let outcome = listener
            .process_buffer(&audio_buffer("remove", "bb4/fa2/1"))
            .await;
        assert_eq!(outcome, ProcessOutcome::Ignored);
        assert_eq!(reporter.records().len(), 1);
    }

    #[tokio::test]
    async fn test_audio_change_is_informational() {
        let (mut listener, reporter, _) = listener(&ListenerConfig::default(), vec![]);

        listener.process_buffer(&audio_buffer("add", "46d/a38/102")).await;
        let outcome = listener
            .process_buffer(&audio_buffer("change", "46d/a38/102"))
            .await;

        assert_eq!(outcome, ProcessOutcome::Ignored);
        assert_eq!(
            listener.attached_audio_product(),
            Some("46d/a38/102".to_string())
        );
        assert_eq!(reporter.records().len(), 1);
    }

    // --- Microphone health ---

    #[tokio::test]
    async fn test_mic_buffer_yields_independent_reports() {
        let (mut listener, reporter, _) = listener(&ListenerConfig::default(), vec![]);

        let outcome = listener
            .process_buffer(
                b"/devices/virtual/amcs/amcs\nMIC_BREAK_STATUS=true,false\nMIC_DEGRADE_STATUS=false,true",
            )
            .await;

        assert_eq!(outcome, ProcessOutcome::Reported);
        let records = reporter.records();
        assert_eq!(records.len(), 2);
        assert!(records.contains(&TelemetryRecord::mic_broken_or_degraded(0, true)));
        assert!(records.contains(&TelemetryRecord::mic_broken_or_degraded(1, false)));
    }

    #[tokio::test]
    async fn test_mic_event_without_markers_is_rejected() {
        let (mut listener, reporter, _) = listener(&ListenerConfig::default(), vec![]);

        let outcome = listener
            .process_buffer(b"/devices/virtual/amcs/amcs\nMIC_BREAK_STATUS=false,false")
            .await;

        assert_eq!(outcome, ProcessOutcome::Rejected);
        assert!(reporter.records().is_empty());
    }

    // --- Overheat ---

    #[tokio::test]
    async fn test_overheat_reports_every_message() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plug_temp"), "320").unwrap();
        std::fs::write(dir.path().join("max_temp"), "495").unwrap();

        let config = ListenerConfig {
            overheat_sysfs_root: dir.path().to_path_buf(),
            ..ListenerConfig::default()
        };
        let (mut listener, reporter, _) = listener(&config, vec![]);

        let buffer = format!("{}\nDRIVER=overheat_mitigation", dir.path().display());
        assert_eq!(
            listener.process_buffer(buffer.as_bytes()).await,
            ProcessOutcome::Reported
        );
        // no deduplication across repeats
        assert_eq!(
            listener.process_buffer(buffer.as_bytes()).await,
            ProcessOutcome::Reported
        );

        let records = reporter.records();
        assert_eq!(records.len(), 2);
        match &records[0] {
            TelemetryRecord::UsbOverheatEvent {
                plug_temperature_deci_c,
                max_temperature_deci_c,
                time_to_overheat_millis,
                ..
            } => {
                assert_eq!(*plug_temperature_deci_c, 320);
                assert_eq!(*max_temperature_deci_c, 495);
                assert_eq!(*time_to_overheat_millis, 0);
            }
            other => panic!("expected UsbOverheatEvent, got {other:?}"),
        }
    }

    // --- Liveness and failure semantics ---

    #[tokio::test]
    async fn test_buffer_without_fields_is_ignored() {
        let (mut listener, reporter, _) = listener(&ListenerConfig::default(), vec![]);

        let outcome = listener
            .process_buffer(b"/devices/platform/soc/power_supply/usb\nbare line\nanother")
            .await;

        assert_eq!(outcome, ProcessOutcome::Ignored);
        assert!(!listener.is_usb_attached());
        assert_eq!(listener.attached_audio_product(), None);
        assert!(reporter.records().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_buffer_leaves_state_untouched() {
        let (mut listener, reporter, _) = listener(&ListenerConfig::default(), vec![]);

        listener.process_buffer(CONNECTOR_ATTACH).await;
        listener.process_buffer(&audio_buffer("add", "46d/a38/102")).await;
        let before = reporter.records();

        assert_eq!(listener.process_buffer(b"").await, ProcessOutcome::Rejected);

        assert!(listener.is_usb_attached());
        assert_eq!(
            listener.attached_audio_product(),
            Some("46d/a38/102".to_string())
        );
        assert_eq!(reporter.records(), before);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_dropped_not_fatal() {
        let (mut listener, reporter, clock) = listener(&ListenerConfig::default(), vec![]);

        reporter.set_failing(true);
        let outcome = listener.process_buffer(CONNECTOR_ATTACH).await;

        // the report was dropped but the transition still happened
        assert_eq!(outcome, ProcessOutcome::Reported);
        assert!(listener.is_usb_attached());
        assert!(reporter.records().is_empty());

        // subsequent events keep flowing once delivery recovers
        reporter.set_failing(false);
        clock.advance(Duration::seconds(10));
        listener.process_buffer(CONNECTOR_DETACH).await;
        assert_eq!(
            reporter.records(),
            vec![TelemetryRecord::connector_disconnected(Duration::seconds(10))]
        );
    }

    #[tokio::test]
    async fn test_process_one_consumes_exactly_one_buffer() {
        let (mut listener, reporter, _) = listener(
            &ListenerConfig::default(),
            vec![CONNECTOR_ATTACH, CONNECTOR_DETACH],
        );

        let outcome = listener.process_one().await.unwrap();
        assert_eq!(outcome, ProcessOutcome::Reported);
        assert_eq!(reporter.records().len(), 1);
        assert!(listener.is_usb_attached());
    }

    #[tokio::test]
    async fn test_listen_exits_only_on_transport_failure() {
        let (mut listener, reporter, _) = listener(
            &ListenerConfig::default(),
            vec![
                CONNECTOR_ATTACH,
                b"",
                b"/devices/irrelevant\nACTION=add",
                CONNECTOR_DETACH,
            ],
        );

        // bad buffers in the stream do not stop the loop; exhaustion of the
        // scripted source simulates the channel closing
        let err = listener.listen().await.unwrap_err();
        assert!(format!("{err:#}").contains("Uevent transport failed"));
        assert_eq!(reporter.records().len(), 2);
    }
}
