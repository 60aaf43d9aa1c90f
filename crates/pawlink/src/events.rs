//! Typed device events for display surfaces.
//!
//! Rendering, animation, and other out-of-scope layers observe the core
//! through this broadcast; nothing in the core waits on a subscriber.

use tokio::sync::{broadcast, watch};

use pawlink_core::{Pet, PetId, Stats};

/// Events published by a device.
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// The primary's selection pointer changed.
    SelectionChanged(Option<PetId>),
    /// The companion accepted a new active pet.
    PetAssigned(Pet),
    /// The companion's assignment was removed.
    Cleared,
    /// A pet's stats changed (local mutation, decay tick, or inbound
    /// update).
    StatsChanged { id: PetId, stats: Stats },
    /// The sleep cycle ended on its own (a bound was reached).
    Woke(PetId),
    /// The primary's inventory mirror was replaced.
    InventoryMirrored,
    /// The peer's reachability flag changed. Advisory only.
    ReachabilityChanged(bool),
}

/// Broadcast bus for [`DeviceEvent`].
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DeviceEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub(crate) fn publish(&self, event: DeviceEvent) {
        let _ = self.tx.send(event);
    }
}

/// Forward reachability changes onto the event bus.
///
/// The task ends when the transport (and with it the watch sender) is
/// dropped.
pub(crate) fn forward_reachability(events: EventBus, mut reachable: watch::Receiver<bool>) {
    tokio::spawn(async move {
        while reachable.changed().await.is_ok() {
            let flag = *reachable.borrow();
            events.publish(DeviceEvent::ReachabilityChanged(flag));
        }
    });
}
