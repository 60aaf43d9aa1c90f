//! SQLite implementation of the RosterStore trait.
//!
//! This is the primary storage backend for Pawlink devices. It uses
//! rusqlite with bundled SQLite behind a mutex; every operation is a
//! short synchronous transaction, so the async methods simply run them
//! inline on the calling task.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use pawlink_core::{Pet, PetId, Stats};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::RosterStore;

/// Meta-table keys. Mirrors the shared durable key space of the devices.
mod keys {
    pub const SELECTED_ID: &str = "selected_pet_id";
    pub const ACTIVE_PET: &str = "active_pet_snapshot";
    pub const SELECTED_STATS: &str = "selected_pet_stats";
}

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute an operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::InvalidData(format!("mutex poisoned: {}", e)))?;
        f(&conn)
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let value: Option<String> = conn
                .query_row(
                    "SELECT value FROM meta WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    fn set_meta(&self, key: &str, value: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            match value {
                Some(value) => {
                    conn.execute(
                        "INSERT INTO meta (key, value) VALUES (?1, ?2)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                        params![key, value],
                    )?;
                }
                None => {
                    conn.execute("DELETE FROM meta WHERE key = ?1", params![key])?;
                }
            }
            Ok(())
        })
    }
}

fn row_to_pet(row: &rusqlite::Row<'_>) -> rusqlite::Result<Pet> {
    let id_bytes: Vec<u8> = row.get("pet_id")?;
    let id = PetId::from_bytes(id_bytes.try_into().map_err(|_| {
        rusqlite::Error::InvalidColumnType(0, "pet_id".into(), rusqlite::types::Type::Blob)
    })?);

    Ok(Pet {
        id,
        name: row.get("name")?,
        appearance: row.get("appearance")?,
        stats: Stats::new(row.get("energy")?, row.get("fullness")?, row.get("happiness")?),
    })
}

#[async_trait]
impl RosterStore for SqliteStore {
    async fn load_roster(&self) -> Result<Vec<Pet>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT pet_id, name, appearance, energy, fullness, happiness
                 FROM pets ORDER BY position",
            )?;
            let pets = stmt
                .query_map([], row_to_pet)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(pets)
        })
    }

    async fn get_pet(&self, id: &PetId) -> Result<Option<Pet>> {
        self.with_conn(|conn| {
            let pet = conn
                .query_row(
                    "SELECT pet_id, name, appearance, energy, fullness, happiness
                     FROM pets WHERE pet_id = ?1",
                    params![id.0.as_slice()],
                    row_to_pet,
                )
                .optional()?;
            Ok(pet)
        })
    }

    async fn insert_pet(&self, pet: &Pet) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO pets (pet_id, position, name, appearance, energy, fullness, happiness)
                 VALUES (?1, (SELECT COALESCE(MAX(position), 0) + 1 FROM pets), ?2, ?3, ?4, ?5, ?6)",
                params![
                    pet.id.0.as_slice(),
                    pet.name,
                    pet.appearance,
                    pet.stats.energy,
                    pet.stats.fullness,
                    pet.stats.happiness,
                ],
            )?;
            Ok(())
        })
    }

    async fn update_pet(&self, pet: &Pet) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE pets SET name = ?2, appearance = ?3,
                 energy = ?4, fullness = ?5, happiness = ?6
                 WHERE pet_id = ?1",
                params![
                    pet.id.0.as_slice(),
                    pet.name,
                    pet.appearance,
                    pet.stats.energy,
                    pet.stats.fullness,
                    pet.stats.happiness,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    async fn set_pet_stats(&self, id: &PetId, stats: &Stats) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE pets SET energy = ?2, fullness = ?3, happiness = ?4
                 WHERE pet_id = ?1",
                params![
                    id.0.as_slice(),
                    stats.energy,
                    stats.fullness,
                    stats.happiness
                ],
            )?;
            Ok(changed > 0)
        })
    }

    async fn remove_pet(&self, id: &PetId) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM pets WHERE pet_id = ?1", params![id.0.as_slice()])?;
            Ok(changed > 0)
        })
    }

    async fn selected_id(&self) -> Result<Option<PetId>> {
        match self.get_meta(keys::SELECTED_ID)? {
            Some(hex) => {
                let id = PetId::from_hex(&hex)
                    .map_err(|e| StoreError::InvalidData(e.to_string()))?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    async fn set_selected_id(&self, id: Option<&PetId>) -> Result<()> {
        self.set_meta(keys::SELECTED_ID, id.map(|i| i.to_hex()).as_deref())
    }

    async fn load_active_pet(&self) -> Result<Option<Pet>> {
        match self.get_meta(keys::ACTIVE_PET)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save_active_pet(&self, pet: Option<&Pet>) -> Result<()> {
        let json = pet.map(serde_json::to_string).transpose()?;
        self.set_meta(keys::ACTIVE_PET, json.as_deref())
    }

    async fn load_selected_stats(&self) -> Result<Option<Stats>> {
        match self.get_meta(keys::SELECTED_STATS)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save_selected_stats(&self, stats: Option<&Stats>) -> Result<()> {
        let json = stats.map(serde_json::to_string).transpose()?;
        self.set_meta(keys::SELECTED_STATS, json.as_deref())
    }

    async fn load_inventory(&self) -> Result<BTreeMap<String, u32>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT item_id, count FROM inventory")?;
            let items = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
                })?
                .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
            Ok(items)
        })
    }

    async fn save_inventory(&self, items: &BTreeMap<String, u32>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM inventory", [])?;
            let mut stmt =
                conn.prepare("INSERT INTO inventory (item_id, count) VALUES (?1, ?2)")?;
            for (item_id, count) in items {
                if *count == 0 {
                    continue; // zero-count entries are removed, not kept
                }
                stmt.execute(params![item_id, count])?;
            }
            Ok(())
        })
    }
}
