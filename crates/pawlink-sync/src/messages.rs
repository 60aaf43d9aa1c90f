//! Peer message types and the validating wire codec.
//!
//! Messages travel as a flat tagged record (CBOR map). The decoder checks
//! the fields required by each `type` and rejects incomplete frames; the
//! receiving device drops rejected frames without effect.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use pawlink_core::{Pet, PetId, Stats};

use crate::error::WireError;

/// Messages exchanged between the primary and companion devices.
///
/// Each kind is handled independently by the receiver; there is no
/// request/response pairing and no ordering guarantee across kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerMessage {
    /// Primary -> companion: assign this pet as the active one.
    ///
    /// Carries the full pet state so the companion can operate offline
    /// without a private round-trip.
    Select { pet: Pet },

    /// Primary -> companion: the selection was removed; return to the
    /// unassigned display state.
    Clear,

    /// Companion -> primary: authoritative stats for a pet the companion
    /// owns (or has just relinquished).
    StatsUpdate { id: PetId, stats: Stats },

    /// Companion -> primary: the full inventory map. Whole-value replace
    /// on the receiving side, never a merge.
    InventoryUpdate { inventory: BTreeMap<String, u32> },
}

impl PeerMessage {
    /// The wire `type` tag for this message.
    pub fn kind(&self) -> &'static str {
        match self {
            PeerMessage::Select { .. } => "select",
            PeerMessage::Clear => "clear",
            PeerMessage::StatsUpdate { .. } => "statsUpdate",
            PeerMessage::InventoryUpdate { .. } => "inventoryUpdate",
        }
    }

    /// The replace-context slot this message coalesces into.
    ///
    /// `Select` and `Clear` share a slot: both describe the current
    /// assignment, and only the latest assignment matters.
    pub fn purpose(&self) -> ContextPurpose {
        match self {
            PeerMessage::Select { .. } | PeerMessage::Clear => ContextPurpose::Assignment,
            PeerMessage::StatsUpdate { .. } => ContextPurpose::Stats,
            PeerMessage::InventoryUpdate { .. } => ContextPurpose::Inventory,
        }
    }
}

/// Logical purpose keys for the replace-context tier.
///
/// One durable slot exists per purpose; a new send overwrites any prior
/// undelivered value for the same purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextPurpose {
    /// The active-pet assignment (`select`/`clear`).
    Assignment,
    /// Latest stats snapshot for a pet.
    Stats,
    /// The full inventory map.
    Inventory,
}

/// The flat tagged record as it appears on the wire.
///
/// Every field except `type` is optional at this layer; which ones are
/// required depends on the `type` and is enforced in [`decode`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct WireRecord {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "appearanceRef", default, skip_serializing_if = "Option::is_none")]
    appearance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    energy: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fullness: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    happiness: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inventory: Option<BTreeMap<String, u32>>,
}

/// Encode a message into a wire frame (CBOR).
pub fn encode(message: &PeerMessage) -> Result<Bytes, WireError> {
    let record = match message {
        PeerMessage::Select { pet } => WireRecord {
            kind: "select".to_string(),
            id: Some(pet.id.to_hex()),
            name: Some(pet.name.clone()),
            appearance: Some(pet.appearance.clone()),
            energy: Some(pet.stats.energy),
            fullness: Some(pet.stats.fullness),
            happiness: Some(pet.stats.happiness),
            ..WireRecord::default()
        },
        PeerMessage::Clear => WireRecord {
            kind: "clear".to_string(),
            ..WireRecord::default()
        },
        PeerMessage::StatsUpdate { id, stats } => WireRecord {
            kind: "statsUpdate".to_string(),
            id: Some(id.to_hex()),
            energy: Some(stats.energy),
            fullness: Some(stats.fullness),
            happiness: Some(stats.happiness),
            ..WireRecord::default()
        },
        PeerMessage::InventoryUpdate { inventory } => WireRecord {
            kind: "inventoryUpdate".to_string(),
            inventory: Some(inventory.clone()),
            ..WireRecord::default()
        },
    };

    let mut buf = Vec::new();
    ciborium::into_writer(&record, &mut buf)
        .map_err(|e| WireError::Malformed(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// Decode a wire frame, enforcing the per-`type` required fields.
pub fn decode(frame: &[u8]) -> Result<PeerMessage, WireError> {
    let record: WireRecord =
        ciborium::from_reader(frame).map_err(|e| WireError::Malformed(e.to_string()))?;

    match record.kind.as_str() {
        "select" => {
            let id = require_id(record.id)?;
            let name = record.name.ok_or(WireError::MissingField("name"))?;
            let appearance = record
                .appearance
                .ok_or(WireError::MissingField("appearanceRef"))?;
            let stats = require_stats(record.energy, record.fullness, record.happiness)?;
            Ok(PeerMessage::Select {
                pet: Pet {
                    id,
                    name,
                    appearance,
                    stats,
                },
            })
        }
        "clear" => Ok(PeerMessage::Clear),
        "statsUpdate" => {
            let id = require_id(record.id)?;
            let stats = require_stats(record.energy, record.fullness, record.happiness)?;
            Ok(PeerMessage::StatsUpdate { id, stats })
        }
        "inventoryUpdate" => {
            let inventory = record
                .inventory
                .ok_or(WireError::MissingField("inventory"))?;
            Ok(PeerMessage::InventoryUpdate { inventory })
        }
        other => Err(WireError::UnknownType(other.to_string())),
    }
}

fn require_id(id: Option<String>) -> Result<PetId, WireError> {
    let raw = id.ok_or(WireError::MissingField("id"))?;
    PetId::from_hex(&raw).map_err(|e| WireError::InvalidField {
        field: "id",
        reason: e.to_string(),
    })
}

fn require_stats(
    energy: Option<i32>,
    fullness: Option<i32>,
    happiness: Option<i32>,
) -> Result<Stats, WireError> {
    let energy = energy.ok_or(WireError::MissingField("energy"))?;
    let fullness = fullness.ok_or(WireError::MissingField("fullness"))?;
    let happiness = happiness.ok_or(WireError::MissingField("happiness"))?;
    Ok(Stats::new(energy, fullness, happiness))
}
