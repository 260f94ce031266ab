//! Uevent source port (driving/primary port)
//!
//! This module defines the interface for the kernel notification transport.
//! Implementations own the channel (e.g. a netlink kobject-uevent socket)
//! and hand the core one already-delimited message buffer per call.
//!
//! ## Design Notes
//!
//! - One buffer equals one logical kernel message; the core never sees
//!   transport framing.
//! - `next_event` blocks (asynchronously) until a message arrives.
//! - An `Err` from `next_event` means the channel itself failed and is the
//!   only condition that terminates the listener loop.

use async_trait::async_trait;

/// Port trait for the raw uevent transport
#[async_trait]
pub trait IUeventSource: Send + Sync {
    /// Waits for and returns the next raw uevent buffer.
    ///
    /// The buffer is newline-delimited: device path first, `KEY=VALUE`
    /// lines after.
    ///
    /// # Errors
    ///
    /// Returns an error only when the transport is unusable (channel
    /// closed or unreadable). This is fatal to the listener.
    async fn next_event(&self) -> anyhow::Result<Vec<u8>>;
}
