//! The primary device: roster owner and selection authority.
//!
//! Holds the full pet list durably, decides which pet is active on the
//! companion, and reconciles inbound stats and inventory updates. Every
//! mutation persists locally before any network push is attempted, and
//! persistence failures are logged rather than raised - in-memory state
//! stays authoritative for the running process.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use pawlink_core::{Effect, Pet, PetId};
use pawlink_store::{RosterStore, StoreError};
use pawlink_sync::{messages, Outbox, PeerMessage, Session, Transport};

use crate::config::DeviceConfig;
use crate::error::Result;
use crate::events::{forward_reachability, DeviceEvent, EventBus};

const DRAIN_POLL: Duration = Duration::from_millis(20);

struct PrimaryState {
    roster: Vec<Pet>,
    selected: Option<PetId>,
    inventory_mirror: BTreeMap<String, u32>,
}

/// The roster-owning device.
pub struct PrimaryDevice<S: RosterStore + 'static, T: Transport + ?Sized> {
    state: Mutex<PrimaryState>,
    store: Arc<S>,
    transport: Arc<T>,
    outbox: Outbox<T>,
    session: Session,
    events: EventBus,
}

impl<S: RosterStore + 'static, T: Transport + ?Sized> PrimaryDevice<S, T> {
    /// Open the device, loading roster, selection, and the inventory
    /// mirror from the local store.
    pub async fn open(store: Arc<S>, transport: Arc<T>, config: DeviceConfig) -> Result<Self> {
        let state = PrimaryState {
            roster: store.load_roster().await?,
            selected: store.selected_id().await?,
            inventory_mirror: store.load_inventory().await?,
        };

        let events = EventBus::new(config.event_capacity);
        let session = Session::new(transport.as_ref());
        forward_reachability(events.clone(), session.subscribe());

        Ok(Self {
            state: Mutex::new(state),
            store,
            outbox: Outbox::new(Arc::clone(&transport)),
            transport,
            session,
            events,
        })
    }

    /// The roster in insertion order.
    pub fn pets(&self) -> Vec<Pet> {
        self.state.lock().unwrap().roster.clone()
    }

    /// The currently selected pet id.
    pub fn selected_id(&self) -> Option<PetId> {
        self.state.lock().unwrap().selected
    }

    /// Read-only mirror of the companion's inventory.
    pub fn inventory(&self) -> BTreeMap<String, u32> {
        self.state.lock().unwrap().inventory_mirror.clone()
    }

    /// Session lifecycle state (advisory reachability).
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Subscribe to device events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Roster operations
    // ─────────────────────────────────────────────────────────────────────

    /// Create a pet with default stats and append it to the roster.
    pub async fn add_pet(&self, name: impl Into<String>, appearance: impl Into<String>) -> Pet {
        let pet = Pet::new(name, appearance);
        self.state.lock().unwrap().roster.push(pet.clone());
        log_persist("add pet", self.store.insert_pet(&pet).await);
        pet
    }

    /// Partially update a pet's editable fields.
    ///
    /// Unknown ids are silently ignored (benign race with deletion). If
    /// the pet is currently selected, the companion is re-sent the full
    /// pet state.
    pub async fn update_pet(&self, id: &PetId, name: Option<&str>, appearance: Option<&str>) {
        let (updated, selected) = {
            let mut state = self.state.lock().unwrap();
            let selected = state.selected;
            match state.roster.iter_mut().find(|p| &p.id == id) {
                Some(pet) => {
                    if let Some(name) = name {
                        pet.name = name.to_string();
                    }
                    if let Some(appearance) = appearance {
                        pet.appearance = appearance.to_string();
                    }
                    (Some(pet.clone()), selected)
                }
                None => (None, selected),
            }
        };

        let Some(pet) = updated else {
            debug!(pet = %id, "update for unknown pet ignored");
            return;
        };

        log_persist("update pet", self.store.update_pet(&pet).await);

        if selected == Some(*id) {
            self.outbox.send(&PeerMessage::Select { pet }).await;
        }
    }

    /// Delete a pet. If it was selected, the selection is cleared and the
    /// companion is notified.
    pub async fn delete_pet(&self, id: &PetId) {
        let (existed, was_selected) = {
            let mut state = self.state.lock().unwrap();
            let before = state.roster.len();
            state.roster.retain(|p| &p.id != id);
            let existed = state.roster.len() != before;
            let was_selected = existed && state.selected == Some(*id);
            if was_selected {
                state.selected = None;
            }
            (existed, was_selected)
        };

        if !existed {
            debug!(pet = %id, "delete for unknown pet ignored");
            return;
        }

        log_persist("delete pet", self.store.remove_pet(id).await);

        if was_selected {
            log_persist("clear selection", self.store.set_selected_id(None).await);
            log_persist(
                "clear handoff cache",
                self.store.save_selected_stats(None).await,
            );
            self.events.publish(DeviceEvent::SelectionChanged(None));
            self.outbox.send(&PeerMessage::Clear).await;
        }
    }

    /// Apply a stat effect to a roster pet. Unknown ids are ignored.
    pub async fn apply_effect(&self, id: &PetId, effect: &Effect) {
        let stats = {
            let mut state = self.state.lock().unwrap();
            match state.roster.iter_mut().find(|p| &p.id == id) {
                Some(pet) => {
                    pet.stats.apply(effect);
                    Some(pet.stats)
                }
                None => None,
            }
        };

        let Some(stats) = stats else {
            debug!(pet = %id, "effect for unknown pet ignored");
            return;
        };

        log_persist("apply effect", self.store.set_pet_stats(id, &stats).await);
        self.events
            .publish(DeviceEvent::StatsChanged { id: *id, stats });
    }

    /// Select the active pet.
    ///
    /// If a different pet was previously selected, the last known
    /// companion stats for it are folded into its roster entry first, so
    /// the handoff never leaves a stale snapshot behind. The newly
    /// selected pet's full state is then pushed to the companion so it
    /// can operate offline.
    pub async fn select(&self, id: &PetId) {
        let previous = self.state.lock().unwrap().selected;

        if let Some(prev) = previous.filter(|prev| prev != id) {
            self.fold_handoff_cache(&prev).await;
        }

        let pet = {
            let mut state = self.state.lock().unwrap();
            state.selected = Some(*id);
            state.roster.iter().find(|p| &p.id == id).cloned()
        };

        log_persist("select pet", self.store.set_selected_id(Some(id)).await);
        self.events.publish(DeviceEvent::SelectionChanged(Some(*id)));

        // An unknown id moves the pointer but there is nothing to push.
        if let Some(pet) = pet {
            log_persist(
                "seed handoff cache",
                self.store.save_selected_stats(Some(&pet.stats)).await,
            );
            self.outbox.send(&PeerMessage::Select { pet }).await;
        }
    }

    /// Fold the handoff cache into the roster entry being relinquished.
    async fn fold_handoff_cache(&self, prev: &PetId) {
        let cached = match self.store.load_selected_stats().await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "handoff cache unreadable, keeping roster stats");
                None
            }
        };
        let Some(stats) = cached else { return };

        let known = {
            let mut state = self.state.lock().unwrap();
            match state.roster.iter_mut().find(|p| &p.id == prev) {
                Some(pet) => {
                    pet.stats = stats;
                    true
                }
                None => false,
            }
        };
        if known {
            log_persist("fold handoff", self.store.set_pet_stats(prev, &stats).await);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reconciliation
    // ─────────────────────────────────────────────────────────────────────

    /// Apply one inbound peer message.
    pub async fn handle_message(&self, message: PeerMessage) {
        match message {
            PeerMessage::StatsUpdate { id, stats } => {
                let (known, selected) = {
                    let mut state = self.state.lock().unwrap();
                    let selected = state.selected;
                    match state.roster.iter_mut().find(|p| p.id == id) {
                        Some(pet) => {
                            // Wholesale replace, never a field merge.
                            pet.stats = stats;
                            (true, selected)
                        }
                        None => (false, selected),
                    }
                };

                if !known {
                    // Benign race: the pet may have been deleted here
                    // while the companion still owned it.
                    debug!(pet = %id, "stats update for unknown pet ignored");
                    return;
                }

                log_persist("stats update", self.store.set_pet_stats(&id, &stats).await);
                if selected == Some(id) {
                    log_persist(
                        "refresh handoff cache",
                        self.store.save_selected_stats(Some(&stats)).await,
                    );
                }
                self.events.publish(DeviceEvent::StatsChanged { id, stats });
            }
            PeerMessage::InventoryUpdate { inventory } => {
                self.state.lock().unwrap().inventory_mirror = inventory.clone();
                log_persist("inventory mirror", self.store.save_inventory(&inventory).await);
                self.events.publish(DeviceEvent::InventoryMirrored);
            }
            PeerMessage::Select { .. } | PeerMessage::Clear => {
                debug!("companion-bound message ignored on primary");
            }
        }
    }

    /// Process inbound frames until the link closes.
    pub async fn run(&self) {
        while let Ok(frame) = self.transport.recv().await {
            self.handle_frame(&frame).await;
        }
    }

    /// Process whatever frames are already inbound, then return.
    pub async fn drain(&self) {
        while let Ok(Some(frame)) = self.transport.recv_timeout(DRAIN_POLL).await {
            self.handle_frame(&frame).await;
        }
    }

    async fn handle_frame(&self, frame: &[u8]) {
        match messages::decode(frame) {
            Ok(message) => self.handle_message(message).await,
            Err(e) => warn!(error = %e, "dropping malformed inbound frame"),
        }
    }
}

/// Log a failed persistence attempt; in-memory state stays authoritative.
fn log_persist<V>(what: &str, result: std::result::Result<V, StoreError>) {
    if let Err(e) = result {
        warn!(error = %e, "{what} not persisted; in-memory state remains authoritative");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawlink_core::Stats;
    use pawlink_store::MemoryStore;
    use pawlink_sync::MemoryLink;

    async fn device() -> (
        PrimaryDevice<MemoryStore, pawlink_sync::MemoryEndpoint>,
        pawlink_sync::MemoryEndpoint,
    ) {
        let (ours, theirs) = MemoryLink::pair();
        let device = PrimaryDevice::open(
            Arc::new(MemoryStore::new()),
            Arc::new(ours),
            DeviceConfig::default(),
        )
        .await
        .unwrap();
        (device, theirs)
    }

    #[tokio::test]
    async fn test_add_pet_defaults_and_persists() {
        let (primary, _peer) = device().await;
        let pet = primary.add_pet("Mochi", "sprite-1").await;

        assert_eq!(pet.stats, Stats::full());
        assert_eq!(primary.pets(), vec![pet.clone()]);
        assert_eq!(
            primary.store.load_roster().await.unwrap(),
            vec![pet]
        );
    }

    #[tokio::test]
    async fn test_select_pushes_full_state() {
        let (primary, peer) = device().await;
        let pet = primary.add_pet("Mochi", "sprite-1").await;
        primary.select(&pet.id).await;

        assert_eq!(primary.selected_id(), Some(pet.id));
        let frame = peer.recv().await.unwrap();
        assert_eq!(
            messages::decode(&frame).unwrap(),
            PeerMessage::Select { pet }
        );
    }

    #[tokio::test]
    async fn test_stats_update_replaces_wholesale() {
        let (primary, _peer) = device().await;
        let pet = primary.add_pet("Mochi", "sprite-1").await;

        let stats = Stats::new(60, 90, 70);
        primary
            .handle_message(PeerMessage::StatsUpdate { id: pet.id, stats })
            .await;

        assert_eq!(primary.pets()[0].stats, stats);
        assert_eq!(
            primary.store.get_pet(&pet.id).await.unwrap().unwrap().stats,
            stats
        );
    }

    #[tokio::test]
    async fn test_stats_update_for_unknown_pet_is_ignored() {
        let (primary, _peer) = device().await;
        primary.add_pet("Mochi", "sprite-1").await;

        primary
            .handle_message(PeerMessage::StatsUpdate {
                id: PetId::random(),
                stats: Stats::new(1, 2, 3),
            })
            .await;

        assert_eq!(primary.pets()[0].stats, Stats::full());
    }

    #[tokio::test]
    async fn test_delete_selected_pet_clears_and_notifies() {
        let (primary, peer) = device().await;
        let pet = primary.add_pet("Mochi", "sprite-1").await;
        primary.select(&pet.id).await;
        let _ = peer.recv().await.unwrap(); // the select push

        primary.delete_pet(&pet.id).await;
        assert_eq!(primary.selected_id(), None);
        assert!(primary.pets().is_empty());

        let frame = peer.recv().await.unwrap();
        assert_eq!(messages::decode(&frame).unwrap(), PeerMessage::Clear);
    }

    #[tokio::test]
    async fn test_update_selected_pet_repushes() {
        let (primary, peer) = device().await;
        let pet = primary.add_pet("Mochi", "sprite-1").await;
        primary.select(&pet.id).await;
        let _ = peer.recv().await.unwrap();

        primary.update_pet(&pet.id, Some("Kuro"), None).await;

        let frame = peer.recv().await.unwrap();
        match messages::decode(&frame).unwrap() {
            PeerMessage::Select { pet } => assert_eq!(pet.name, "Kuro"),
            other => panic!("expected Select, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inventory_update_replaces_mirror() {
        let (primary, _peer) = device().await;

        let mut first = BTreeMap::new();
        first.insert("apple".to_string(), 3);
        first.insert("ball".to_string(), 1);
        primary
            .handle_message(PeerMessage::InventoryUpdate { inventory: first })
            .await;

        let mut second = BTreeMap::new();
        second.insert("apple".to_string(), 1);
        primary
            .handle_message(PeerMessage::InventoryUpdate {
                inventory: second.clone(),
            })
            .await;

        // Whole-value replace: "ball" is gone, not merged.
        assert_eq!(primary.inventory(), second);
    }

    #[tokio::test]
    async fn test_malformed_frame_is_dropped() {
        let (primary, peer) = device().await;
        primary.add_pet("Mochi", "sprite-1").await;

        peer.send_direct(pawlink_sync::Frame::from_static(b"garbage"))
            .await
            .unwrap();
        primary.drain().await;

        assert_eq!(primary.pets()[0].stats, Stats::full());
    }
}
