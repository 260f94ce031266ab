//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IUeventSource`] - Delivers one already-delimited uevent buffer at a time
//! - [`IStatsReporter`] - Forwards telemetry records to the statistics service
//! - [`IClock`] - Wall-clock access, injectable for tests

pub mod clock;
pub mod event_source;
pub mod stats_reporter;

pub use clock::{IClock, SystemClock};
pub use event_source::IUeventSource;
pub use stats_reporter::IStatsReporter;
