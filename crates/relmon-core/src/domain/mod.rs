//! Domain logic for the reliability listener
//!
//! This module contains the core domain types for relmon:
//! - Uevent parsing (raw buffer to device path + field map)
//! - Event classification into the four reliability families
//! - Per-family state machines (USB connector, USB audio accessory)
//! - Stateless microphone health and overheat decoding
//! - Telemetry record types for the statistics backend
//! - Domain-specific error types

pub mod audio;
pub mod classify;
pub mod connector;
pub mod errors;
pub mod mic;
pub mod overheat;
pub mod telemetry;
pub mod uevent;

// Re-export commonly used types
pub use audio::{AudioAccessoryState, AudioAction, AudioTransition};
pub use classify::{Candidate, Classifier};
pub use connector::{ConnectorState, ConnectorTransition};
pub use errors::DomainError;
pub use mic::MicHealth;
pub use overheat::OverheatReading;
pub use telemetry::TelemetryRecord;
pub use uevent::Uevent;
