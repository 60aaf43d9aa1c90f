//! # Pawlink Core
//!
//! Pure primitives for Pawlink: pets, vitality stats, effects, and the
//! sleep cycle.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over small value types.
//!
//! ## Key Types
//!
//! - [`Pet`] - A pet record: identity, display fields, and stats
//! - [`PetId`] - Opaque 16-byte pet identifier
//! - [`Stats`] - Three bounded vitality gauges, clamped to `[0, 100]`
//! - [`Effect`] - A sparse stat delta (feeding, playing, sleeping)
//! - [`BehaviorMode`] - Per-device behavioral mode (`Idle`/`Sleeping`)
//!
//! ## Sleep Cycle
//!
//! The autonomous decay applied while a pet rests is a pure function,
//! [`sleep_tick`]. The timer that drives it lives in the `pawlink` facade
//! crate; this crate only decides what one tick does and when it ends.

pub mod decay;
pub mod error;
pub mod pet;
pub mod stats;
pub mod types;

pub use decay::{sleep_tick, BehaviorMode, TickOutcome, SLEEP_EFFECT};
pub use error::CoreError;
pub use pet::Pet;
pub use stats::{Effect, Stats, STAT_MAX, STAT_MIN};
pub use types::PetId;
