//! # Pawlink
//!
//! Cross-device state synchronization for a roster of virtual pets.
//!
//! A [`PrimaryDevice`] holds the durable roster and decides which pet is
//! active; a [`CompanionDevice`] renders and mutates exactly one active
//! pet at a time. The two reconcile over a tiered best-effort channel
//! ([`pawlink_sync`]): the companion flushes a pet's stats back before
//! relinquishing it, and every inbound update is a whole-value replace:
//! by the handoff discipline only one side mutates a given pet's stats at
//! a time, so no field-level merging is ever needed.
//!
//! ## Ownership and handoff
//!
//! At any instant at most one device is the active mutator of a pet's
//! stats. Ownership moves only on an explicit selection change, and the
//! outgoing owner's stats are flushed to the incoming owner before the
//! new assignment is applied. Each device's own persistence is the only
//! durable truth; synchronization never blocks or fails a local mutation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pawlink::{CompanionDevice, DeviceConfig, PrimaryDevice};
//! use pawlink_store::MemoryStore;
//! use pawlink_sync::MemoryLink;
//!
//! # async fn example() -> Result<(), pawlink::DeviceError> {
//! let (phone_end, watch_end) = MemoryLink::pair();
//!
//! let primary = PrimaryDevice::open(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(phone_end),
//!     DeviceConfig::default(),
//! ).await?;
//!
//! let companion = CompanionDevice::open(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(watch_end),
//!     DeviceConfig::default(),
//! ).await?;
//!
//! let pet = primary.add_pet("Mochi", "sprite-1").await;
//! primary.select(&pet.id).await;
//! companion.drain().await; // receive the assignment
//! companion.start_rest();
//! # Ok(())
//! # }
//! ```

pub mod companion;
pub mod config;
pub mod decay;
pub mod error;
pub mod events;
pub mod primary;

pub use companion::CompanionDevice;
pub use config::DeviceConfig;
pub use decay::{DecayConfig, DecayEngine, DEFAULT_TICK_PERIOD};
pub use error::{DeviceError, Result};
pub use events::{DeviceEvent, EventBus};
pub use primary::PrimaryDevice;

pub use pawlink_core::{sleep_tick, BehaviorMode, Effect, Pet, PetId, Stats, TickOutcome};
pub use pawlink_store::{MemoryStore, RosterStore, SqliteStore};
pub use pawlink_sync::{ContextPurpose, Outbox, PeerMessage, Session, Transport};
