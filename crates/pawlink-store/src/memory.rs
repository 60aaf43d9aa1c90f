//! In-memory implementation of the RosterStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use pawlink_core::{Pet, PetId, Stats};

use crate::error::Result;
use crate::traits::RosterStore;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Roster in insertion order.
    roster: Vec<Pet>,

    /// Selection pointer.
    selected: Option<PetId>,

    /// Companion snapshot of the active pet.
    active_pet: Option<Pet>,

    /// Primary handoff stats cache.
    selected_stats: Option<Stats>,

    /// Inventory map.
    inventory: BTreeMap<String, u32>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RosterStore for MemoryStore {
    async fn load_roster(&self) -> Result<Vec<Pet>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.roster.clone())
    }

    async fn get_pet(&self, id: &PetId) -> Result<Option<Pet>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.roster.iter().find(|p| &p.id == id).cloned())
    }

    async fn insert_pet(&self, pet: &Pet) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.roster.push(pet.clone());
        Ok(())
    }

    async fn update_pet(&self, pet: &Pet) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        match inner.roster.iter_mut().find(|p| p.id == pet.id) {
            Some(slot) => {
                *slot = pet.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_pet_stats(&self, id: &PetId, stats: &Stats) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        match inner.roster.iter_mut().find(|p| &p.id == id) {
            Some(slot) => {
                slot.stats = *stats;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_pet(&self, id: &PetId) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        let before = inner.roster.len();
        inner.roster.retain(|p| &p.id != id);
        Ok(inner.roster.len() != before)
    }

    async fn selected_id(&self) -> Result<Option<PetId>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.selected)
    }

    async fn set_selected_id(&self, id: Option<&PetId>) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.selected = id.copied();
        Ok(())
    }

    async fn load_active_pet(&self) -> Result<Option<Pet>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.active_pet.clone())
    }

    async fn save_active_pet(&self, pet: Option<&Pet>) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.active_pet = pet.cloned();
        Ok(())
    }

    async fn load_selected_stats(&self) -> Result<Option<Stats>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.selected_stats)
    }

    async fn save_selected_stats(&self, stats: Option<&Stats>) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.selected_stats = stats.copied();
        Ok(())
    }

    async fn load_inventory(&self) -> Result<BTreeMap<String, u32>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.inventory.clone())
    }

    async fn save_inventory(&self, items: &BTreeMap<String, u32>) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        // Zero-count entries are removed, not kept, same as SQLite.
        inner.inventory = items
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(id, count)| (id.clone(), *count))
            .collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roster_insert_order() {
        let store = MemoryStore::new();
        let a = Pet::new("A", "s1");
        let b = Pet::new("B", "s2");
        store.insert_pet(&a).await.unwrap();
        store.insert_pet(&b).await.unwrap();

        let roster = store.load_roster().await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].id, a.id);
        assert_eq!(roster[1].id, b.id);
    }

    #[tokio::test]
    async fn test_update_unknown_pet_is_false() {
        let store = MemoryStore::new();
        let ghost = Pet::new("Ghost", "s");
        assert!(!store.update_pet(&ghost).await.unwrap());
        assert!(!store.set_pet_stats(&ghost.id, &Stats::full()).await.unwrap());
        assert!(!store.remove_pet(&ghost.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_selection_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.selected_id().await.unwrap(), None);

        let id = PetId::random();
        store.set_selected_id(Some(&id)).await.unwrap();
        assert_eq!(store.selected_id().await.unwrap(), Some(id));

        store.set_selected_id(None).await.unwrap();
        assert_eq!(store.selected_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_inventory_drops_zero_counts() {
        let store = MemoryStore::new();
        let mut items = BTreeMap::new();
        items.insert("apple".to_string(), 3);
        items.insert("ball".to_string(), 0);

        store.save_inventory(&items).await.unwrap();
        let loaded = store.load_inventory().await.unwrap();
        assert_eq!(loaded.get("apple"), Some(&3));
        assert!(!loaded.contains_key("ball"));
    }

    #[tokio::test]
    async fn test_active_pet_snapshot() {
        let store = MemoryStore::new();
        let pet = Pet::new("Mochi", "s");
        store.save_active_pet(Some(&pet)).await.unwrap();
        assert_eq!(store.load_active_pet().await.unwrap(), Some(pet));

        store.save_active_pet(None).await.unwrap();
        assert_eq!(store.load_active_pet().await.unwrap(), None);
    }
}
