//! Domain error types
//!
//! This module defines error types specific to domain operations. Most
//! parse-level irregularities in uevents are deliberately *not* errors
//! (absence of a field is the uniform "unknown" signal); only values that
//! were present but unusable surface here.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// ACTION field carried a value outside add/remove/change
    #[error("Unknown uevent action: {0}")]
    UnknownAction(String),

    /// A classified event was missing a field its family requires
    #[error("Missing required field {0}")]
    MissingField(&'static str),
}
