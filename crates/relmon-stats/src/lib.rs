//! HTTP adapter for the statistics-collection service
//!
//! Implements the core's `IStatsReporter` port by POSTing telemetry records
//! as JSON envelopes to the configured endpoint. Delivery is best-effort:
//! callers treat a returned error as "logged and dropped".

pub mod client;

pub use client::StatsClient;
