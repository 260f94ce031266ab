//! Relmon Core - Domain logic for the hardware-reliability uevent listener
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain logic** - uevent parsing, event classification, per-subsystem
//!   state machines, telemetry record construction
//! - **Port definitions** - Traits for adapters: `IUeventSource`,
//!   `IStatsReporter`, `IClock`
//! - **Use case** - `UeventListener`, the dispatch loop that turns raw
//!   kernel notifications into reliability reports
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external
//! dependencies. Ports define trait interfaces that adapter crates implement
//! (netlink transport, HTTP stats forwarding). The use case orchestrates the
//! domain through port interfaces and is the only place that mutates state.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
