//! The companion device: renders and mutates one active pet.
//!
//! Holds a single pet snapshot (persisted for offline startup), runs the
//! decay engine while the pet rests, and is the sole writer of the
//! inventory. Whenever it is about to stop being the active mutator of a
//! pet - a different pet is assigned, or the assignment is cleared - it
//! flushes that pet's stats to the primary *before* applying the change
//! locally, so the roster never observes a stale snapshot.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use pawlink_core::{BehaviorMode, Effect, Pet};
use pawlink_store::{RosterStore, StoreError};
use pawlink_sync::{messages, Outbox, PeerMessage, Session, Transport};

use crate::config::DeviceConfig;
use crate::decay::{ActiveState, DecayEngine};
use crate::error::Result;
use crate::events::{forward_reachability, DeviceEvent, EventBus};

const DRAIN_POLL: Duration = Duration::from_millis(20);

/// The companion device.
pub struct CompanionDevice<S: RosterStore + 'static, T: Transport + ?Sized> {
    state: Arc<Mutex<ActiveState>>,
    inventory: Mutex<BTreeMap<String, u32>>,
    store: Arc<S>,
    transport: Arc<T>,
    outbox: Outbox<T>,
    session: Session,
    events: EventBus,
    decay: DecayEngine<S>,
}

impl<S: RosterStore + 'static, T: Transport + ?Sized> CompanionDevice<S, T> {
    /// Open the device, restoring the active-pet snapshot and inventory
    /// from the local store. The behavioral mode always starts `Idle`.
    pub async fn open(store: Arc<S>, transport: Arc<T>, config: DeviceConfig) -> Result<Self> {
        let state = Arc::new(Mutex::new(ActiveState {
            pet: store.load_active_pet().await?,
            mode: BehaviorMode::Idle,
        }));
        let inventory = store.load_inventory().await?;

        let events = EventBus::new(config.event_capacity);
        let session = Session::new(transport.as_ref());
        forward_reachability(events.clone(), session.subscribe());

        let decay = DecayEngine::new(
            Arc::clone(&state),
            Arc::clone(&store),
            events.clone(),
            config.decay,
        );

        Ok(Self {
            state,
            inventory: Mutex::new(inventory),
            store,
            outbox: Outbox::new(Arc::clone(&transport)),
            transport,
            session,
            events,
            decay,
        })
    }

    /// The active pet, if one is assigned.
    pub fn active_pet(&self) -> Option<Pet> {
        self.state.lock().unwrap().pet.clone()
    }

    /// Current behavioral mode.
    pub fn mode(&self) -> BehaviorMode {
        self.decay.mode()
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
    // Pet interaction
    // ─────────────────────────────────────────────────────────────────────

    /// Apply a stat effect (feeding, playing) to the active pet.
    ///
    /// No-op when no pet is assigned. Stats are not pushed to the primary
    /// here; they travel with the next handoff flush.
    pub async fn apply_effect(&self, effect: &Effect) {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            match state.pet.as_mut() {
                Some(pet) => {
                    pet.stats.apply(effect);
                    Some(pet.clone())
                }
                None => None,
            }
        };

        let Some(pet) = snapshot else { return };
        log_persist("apply effect", self.store.save_active_pet(Some(&pet)).await);
        self.events.publish(DeviceEvent::StatsChanged {
            id: pet.id,
            stats: pet.stats,
        });
    }

    /// Begin resting. No-op unless a pet is assigned and idle.
    pub fn start_rest(&self) {
        self.decay.start_rest();
    }

    /// Wake up. Safe from any state.
    pub fn wake(&self) {
        self.decay.wake();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inventory (companion is the sole writer)
    // ─────────────────────────────────────────────────────────────────────

    /// Number of a given item owned.
    pub fn item_count(&self, item_id: &str) -> u32 {
        self.inventory
            .lock()
            .unwrap()
            .get(item_id)
            .copied()
            .unwrap_or(0)
    }

    /// Whether at least one of the item is owned.
    pub fn has_item(&self, item_id: &str) -> bool {
        self.item_count(item_id) > 0
    }

    /// The full inventory map.
    pub fn inventory(&self) -> BTreeMap<String, u32> {
        self.inventory.lock().unwrap().clone()
    }

    /// Add items to the inventory.
    pub async fn add_item(&self, item_id: &str, count: u32) {
        let snapshot = {
            let mut inventory = self.inventory.lock().unwrap();
            *inventory.entry(item_id.to_string()).or_insert(0) += count;
            inventory.clone()
        };
        self.push_inventory(snapshot).await;
    }

    /// Consume one of an item. Returns `false` if none are owned.
    ///
    /// An entry that reaches zero is removed, not kept at zero.
    pub async fn use_item(&self, item_id: &str) -> bool {
        let snapshot = {
            let mut inventory = self.inventory.lock().unwrap();
            match inventory.get_mut(item_id) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    if *count == 0 {
                        inventory.remove(item_id);
                    }
                }
                _ => return false,
            }
            inventory.clone()
        };
        self.push_inventory(snapshot).await;
        true
    }

    async fn push_inventory(&self, snapshot: BTreeMap<String, u32>) {
        log_persist("inventory", self.store.save_inventory(&snapshot).await);
        self.outbox
            .send(&PeerMessage::InventoryUpdate {
                inventory: snapshot,
            })
            .await;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reconciliation
    // ─────────────────────────────────────────────────────────────────────

    /// Apply one inbound peer message.
    pub async fn handle_message(&self, message: PeerMessage) {
        match message {
            PeerMessage::Select { pet } => self.accept_assignment(pet).await,
            PeerMessage::Clear => self.clear_assignment().await,
            PeerMessage::StatsUpdate { .. } | PeerMessage::InventoryUpdate { .. } => {
                debug!("primary-bound message ignored on companion");
            }
        }
    }

    /// Replace the active pet with the incoming assignment.
    ///
    /// If a different pet is currently held, its stats are flushed to the
    /// primary first - the handoff rule. The incoming payload then
    /// overwrites the whole snapshot and the mode resets to `Idle`.
    async fn accept_assignment(&self, pet: Pet) {
        let relinquished = {
            let state = self.state.lock().unwrap();
            state
                .pet
                .as_ref()
                .filter(|held| held.id != pet.id)
                .map(|held| (held.id, held.stats))
        };

        if let Some((id, stats)) = relinquished {
            self.outbox
                .send(&PeerMessage::StatsUpdate { id, stats })
                .await;
        }

        self.decay.wake();
        {
            let mut state = self.state.lock().unwrap();
            state.pet = Some(pet.clone());
            state.mode = BehaviorMode::Idle;
        }

        log_persist("assignment", self.store.save_active_pet(Some(&pet)).await);
        self.events.publish(DeviceEvent::PetAssigned(pet));
    }

    /// Drop the assignment and return to the unassigned display state.
    ///
    /// Being cleared also ends this device's ownership, so the held
    /// pet's stats are flushed first, same as on a switch. If the pet
    /// was deleted on the primary, that flush lands on an unknown id and
    /// is ignored there - a benign race.
    async fn clear_assignment(&self) {
        let relinquished = {
            let state = self.state.lock().unwrap();
            state.pet.as_ref().map(|held| (held.id, held.stats))
        };
        if let Some((id, stats)) = relinquished {
            self.outbox
                .send(&PeerMessage::StatsUpdate { id, stats })
                .await;
        }

        self.decay.wake();
        {
            let mut state = self.state.lock().unwrap();
            state.pet = None;
            state.mode = BehaviorMode::Idle;
        }

        log_persist("clear assignment", self.store.save_active_pet(None).await);
        self.events.publish(DeviceEvent::Cleared);
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
