//! The pet record.

use serde::{Deserialize, Serialize};

use crate::stats::Stats;
use crate::types::PetId;

/// A virtual pet.
///
/// Created on the roster-owning device only. `id` is immutable after
/// creation; `name` and `appearance` are editable; `stats` are mutated by
/// whichever device currently owns the pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    /// Reference to the sprite/image set used by the rendering layer.
    pub appearance: String,
    pub stats: Stats,
}

impl Pet {
    /// Create a new pet with a fresh id and full stats.
    pub fn new(name: impl Into<String>, appearance: impl Into<String>) -> Self {
        Self {
            id: PetId::random(),
            name: name.into(),
            appearance: appearance.into(),
            stats: Stats::full(),
        }
    }
}
