use std::path::PathBuf;

use crate::import::ImportError;

/// Failure of the underlying key-value storage.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("failed to read slot at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write slot at {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The slot refuses writes, e.g. because its quota is exhausted.
    #[error("slot {key} is not writable: {reason}")]
    Unavailable { key: String, reason: String },
}

/// Errors from loading or saving the persisted fleet.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error("stored fleet is not valid JSON")]
    Syntax(#[source] serde_json::Error),

    #[error("stored fleet has an unexpected shape")]
    Shape(#[from] ImportError),

    #[error("failed to serialize fleet")]
    Serialize(#[source] serde_json::Error),
}
