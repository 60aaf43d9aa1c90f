//! # Pawlink Sync
//!
//! Peer-to-peer delivery between the primary and companion devices.
//!
//! ## Overview
//!
//! The two devices exchange a small set of tagged messages over a channel
//! that offers three delivery tiers with different guarantees:
//!
//! 1. **Direct message** - lowest latency; fails immediately when the peer
//!    is not live, no retry.
//! 2. **Replace-context** - a durable single-slot mailbox per logical
//!    purpose; a newer value overwrites an undelivered older one, so only
//!    the latest survives.
//! 3. **Queued transfer** - an ordered durable queue that eventually
//!    delivers every item, surviving relaunches of either process.
//!
//! [`Outbox`] walks the tiers in strict order for every logical send and
//! never surfaces a failure to the caller: synchronization is best-effort,
//! and only each device's own persistence is durable truth.
//!
//! ## Message Flow
//!
//! ```text
//! Primary                              Companion
//!   |-------- select(pet B) ------------>|
//!   |<------- statsUpdate(pet A) --------|   (flush before accepting B)
//!   |<------- inventoryUpdate(map) ------|
//!   |-------- clear() ------------------>|
//! ```
//!
//! Inbound frames that do not decode to a complete message for their
//! `type` are dropped by the receiving device, never answered.

pub mod delivery;
pub mod error;
pub mod messages;
pub mod session;
pub mod transport;

pub use delivery::Outbox;
pub use error::{Result, SyncError, WireError};
pub use messages::{ContextPurpose, PeerMessage};
pub use session::Session;
pub use transport::{memory::MemoryEndpoint, memory::MemoryLink, Frame, Transport};
