//! RosterStore trait: the abstract interface for device persistence.
//!
//! This trait keeps the devices storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests).

use std::collections::BTreeMap;

use async_trait::async_trait;
use pawlink_core::{Pet, PetId, Stats};

use crate::error::Result;

/// The RosterStore trait: async interface for device persistence.
///
/// A single store instance backs a single device. The primary device uses
/// the roster, selection, and handoff-cache groups; the companion uses the
/// selection snapshot and inventory groups. The unused groups simply stay
/// empty; the schema is shared so a test can inspect either side.
///
/// # Design Notes
///
/// - **Idempotent writes**: saving the same value twice is not an error.
/// - **Unknown ids**: updates to absent pets return `false`, they do not
///   fail. Concurrent deletion is a benign race.
/// - **Roster order**: insertion order is preserved across reloads.
#[async_trait]
pub trait RosterStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────
    // Roster (primary device)
    // ─────────────────────────────────────────────────────────────────────

    /// Load the full roster in insertion order.
    async fn load_roster(&self) -> Result<Vec<Pet>>;

    /// Get one pet by id.
    async fn get_pet(&self, id: &PetId) -> Result<Option<Pet>>;

    /// Append a pet to the roster.
    async fn insert_pet(&self, pet: &Pet) -> Result<()>;

    /// Replace an existing pet record wholesale.
    ///
    /// Returns `false` if the id is unknown.
    async fn update_pet(&self, pet: &Pet) -> Result<bool>;

    /// Replace only the stats of an existing pet.
    ///
    /// Returns `false` if the id is unknown.
    async fn set_pet_stats(&self, id: &PetId, stats: &Stats) -> Result<bool>;

    /// Remove a pet. Returns `false` if the id is unknown.
    async fn remove_pet(&self, id: &PetId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────

    /// The currently selected pet id, if any.
    async fn selected_id(&self) -> Result<Option<PetId>>;

    /// Set or clear the selection pointer.
    async fn set_selected_id(&self, id: Option<&PetId>) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────
    // Active-pet snapshot (companion device)
    // ─────────────────────────────────────────────────────────────────────

    /// Load the cached copy of the active pet for offline startup.
    async fn load_active_pet(&self) -> Result<Option<Pet>>;

    /// Save or clear the cached copy of the active pet.
    async fn save_active_pet(&self, pet: Option<&Pet>) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────
    // Handoff stats cache (primary device)
    // ─────────────────────────────────────────────────────────────────────

    /// The last stats the primary has seen for the selected pet.
    async fn load_selected_stats(&self) -> Result<Option<Stats>>;

    /// Save or clear the handoff stats cache.
    async fn save_selected_stats(&self, stats: Option<&Stats>) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────
    // Inventory
    // ─────────────────────────────────────────────────────────────────────

    /// Load the inventory map (owner's items, or the primary's mirror).
    async fn load_inventory(&self) -> Result<BTreeMap<String, u32>>;

    /// Replace the inventory map wholesale.
    async fn save_inventory(&self, items: &BTreeMap<String, u32>) -> Result<()>;
}
