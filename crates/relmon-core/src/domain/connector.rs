//! USB connector state machine
//!
//! Tracks the attach state of the USB-C port from
//! `POWER_SUPPLY_TYPEC_MODE` uevents.
//!
//! ## State Machine
//!
//! ```text
//!               mode != "Nothing attached"
//!     ┌──────────┐ ───────────────────────► ┌──────────┐
//!     │ Detached │                          │ Attached │
//!     └──────────┘ ◄─────────────────────── └──────────┘
//!               mode == "Nothing attached"
//! ```
//!
//! Repeated notifications for the same attach state produce no transition
//! and no report (debounce). The attach timestamp is recorded on the
//! Detached → Attached edge and consumed on the reverse edge to derive the
//! connection duration.

use chrono::{DateTime, Duration, Utc};

/// Field carrying the Type-C partner mode on power-supply uevents.
pub const TYPEC_MODE_FIELD: &str = "POWER_SUPPLY_TYPEC_MODE";

/// Mode value the driver reports when no partner is connected.
const MODE_NOTHING_ATTACHED: &str = "Nothing attached";

/// Attach state of the USB-C connector
///
/// One instance lives for the whole process; `since` is meaningful only in
/// the `Attached` variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectorState {
    /// No partner connected
    #[default]
    Detached,
    /// A partner is connected
    Attached {
        /// Last reported Type-C mode value
        mode: String,
        /// When the Detached → Attached transition was observed
        since: DateTime<Utc>,
    },
}

/// Observable transition produced by a mode notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorTransition {
    /// A partner was connected; carries the reported mode
    Connected { mode: String },
    /// The partner was disconnected; carries the elapsed connection time
    Disconnected { duration: Duration },
}

impl ConnectorState {
    /// Returns true if a partner is currently attached.
    pub fn is_attached(&self) -> bool {
        matches!(self, ConnectorState::Attached { .. })
    }

    /// Applies a `POWER_SUPPLY_TYPEC_MODE` value observed at `now`.
    ///
    /// Consumes the current state and returns the next state plus the
    /// transition to report, if any. Same-state repeats return no
    /// transition; a mode change while attached updates the recorded mode
    /// without reporting.
    pub fn on_mode(self, mode: &str, now: DateTime<Utc>) -> (Self, Option<ConnectorTransition>) {
        let partner_present = mode != MODE_NOTHING_ATTACHED;

        match (self, partner_present) {
            (ConnectorState::Detached, true) => (
                ConnectorState::Attached {
                    mode: mode.to_string(),
                    since: now,
                },
                Some(ConnectorTransition::Connected {
                    mode: mode.to_string(),
                }),
            ),
            (ConnectorState::Detached, false) => (ConnectorState::Detached, None),
            (ConnectorState::Attached { since, .. }, true) => (
                ConnectorState::Attached {
                    mode: mode.to_string(),
                    since,
                },
                None,
            ),
            (ConnectorState::Attached { since, .. }, false) => (
                ConnectorState::Detached,
                Some(ConnectorTransition::Disconnected {
                    duration: now - since,
                }),
            ),
        }
    }
}
