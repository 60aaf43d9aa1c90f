//! # Pawlink Testkit
//!
//! Shared fixtures and proptest generators for exercising Pawlink.
//!
//! The central fixture is [`DevicePair`]: a primary and a companion
//! device wired over an in-memory link, with the raw endpoints exposed so
//! tests can park a side offline, fail a delivery tier, or inspect the
//! undelivered mailboxes.

pub mod fixtures;
pub mod generators;

pub use fixtures::{init_tracing, DevicePair};
pub use generators::{arb_effect, arb_stats};
