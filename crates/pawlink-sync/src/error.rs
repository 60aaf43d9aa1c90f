//! Error types for the sync module.

use thiserror::Error;

/// Errors that can occur during transport operations.
///
/// These drive the tier fallback inside [`crate::Outbox`]; they are never
/// surfaced to the interactive user.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The peer process is not currently live, or did not acknowledge.
    #[error("peer not reachable")]
    Unreachable,

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The inbound channel is closed; the link is gone.
    #[error("transport channel closed")]
    ChannelClosed,

    /// Frame encoding/decoding failed.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
}

/// Errors from the wire codec.
///
/// A frame that fails to decode is dropped by the receiver without
/// effect; no retry is solicited from the sender.
#[derive(Debug, Error)]
pub enum WireError {
    /// The frame is not valid CBOR or not a record at all.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The record's `type` tag is not one we know.
    #[error("unknown message type: {0:?}")]
    UnknownType(String),

    /// A field required by the record's `type` is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field is present but unusable (e.g. a non-hex id).
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
