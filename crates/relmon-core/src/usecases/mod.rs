//! Use cases (interactors) for relmon
//!
//! This module contains the application use case that orchestrates the
//! domain through port interfaces. The use case is a thin coordinator: it
//! delegates parsing, classification, and transitions to domain methods and
//! delegates I/O to ports.
//!
//! ## Use Cases
//!
//! - [`UeventListener`] - The dispatch loop turning raw uevents into reports

pub mod listen;

pub use listen::{ProcessOutcome, UeventListener};
