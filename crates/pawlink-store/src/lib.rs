//! # Pawlink Store
//!
//! Durable per-device persistence for Pawlink.
//!
//! Each device keeps its own local truth: the roster (primary), the
//! selection pointer, the active-pet snapshot (companion, for offline
//! startup), the primary's handoff stats cache, and the inventory map.
//! All mutations are persisted synchronously before any network push is
//! attempted; durability precedes, and is independent of, sync success.
//!
//! Two implementations of the [`RosterStore`] trait:
//!
//! - [`SqliteStore`] - the primary backend (rusqlite, bundled SQLite)
//! - [`MemoryStore`] - same semantics, no persistence; for tests

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::RosterStore;
