//! Error types for the device facade.
//!
//! Sync failures never surface here: the delivery ladder swallows them
//! and malformed inbound frames are dropped. The only fallible public
//! surface is device startup, where a broken store is a real failure.

use thiserror::Error;

/// Errors that can occur while opening a device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device's local store failed.
    #[error("store error: {0}")]
    Store(#[from] pawlink_store::StoreError),
}

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;
