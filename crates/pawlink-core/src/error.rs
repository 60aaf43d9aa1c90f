//! Error types for the core crate.

use thiserror::Error;

/// Errors from core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A pet id string failed to parse (wrong length or not hex).
    #[error("invalid pet id: {0:?}")]
    InvalidPetId(String),
}
