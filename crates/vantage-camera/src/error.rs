use thiserror::Error;

use crate::camera::BookmarkId;

/// Errors raised at the persistence boundary.
///
/// Callers inside the engine catch these, log them, and keep their
/// in-memory state.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error for key '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unsupported envelope version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by camera operations that address something by id or name.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CameraError {
    #[error("no bookmark with id {0}")]
    UnknownBookmark(BookmarkId),

    #[error("no motion preset named '{0}'")]
    UnknownPreset(String),

    #[error("no camera sink is bound")]
    MissingBinding,
}
