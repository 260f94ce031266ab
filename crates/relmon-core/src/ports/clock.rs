//! Clock port
//!
//! Attach timestamps and derived durations come from this port rather than
//! `Utc::now()` directly, so tests can drive the listener with synthetic
//! time.

use chrono::{DateTime, Utc};

/// Port trait for wall-clock access
pub trait IClock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl IClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
