//! Strong type definitions for Pawlink.
//!
//! Identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A 16-byte opaque pet identifier.
///
/// Identity is assigned once at creation on the roster-owning device and
/// never changes afterwards. On the wire and in storage metadata the id
/// travels as a hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PetId(pub [u8; 16]);

impl PetId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Generate a fresh random id.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::thread_rng().gen())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|_| CoreError::InvalidPetId(s.to_string()))?;
        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidPetId(s.to_string()))?;
        Ok(Self(arr))
    }

    /// The zero pet id (sentinel, never assigned to a real pet).
    pub const ZERO: Self = Self([0u8; 16]);
}

impl fmt::Debug for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PetId({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for PetId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 16]> for PetId {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pet_id_hex_roundtrip() {
        let id = PetId::from_bytes([0x42; 16]);
        let hex = id.to_hex();
        let recovered = PetId::from_hex(&hex).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_pet_id_rejects_bad_hex() {
        assert!(PetId::from_hex("not hex").is_err());
        assert!(PetId::from_hex("abcd").is_err()); // too short
    }

    #[test]
    fn test_pet_id_random_is_unique() {
        let a = PetId::random();
        let b = PetId::random();
        assert_ne!(a, b);
    }

    #[test]
    fn test_pet_id_debug() {
        let id = PetId::from_bytes([0xcd; 16]);
        let debug = format!("{:?}", id);
        assert!(debug.starts_with("PetId("));
    }
}
