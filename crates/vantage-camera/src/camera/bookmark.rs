use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vantage_core::CameraPose;

use crate::persistence::Migrate;

/// Unique identifier for a bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookmarkId(pub Uuid);

impl BookmarkId {
    /// Create a new random bookmark ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BookmarkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Named camera pose snapshot; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraBookmark {
    pub id: BookmarkId,
    pub name: String,
    pub pose: CameraPose,
    pub created_at: DateTime<Utc>,
    /// Encoded preview image, if the host captured one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl CameraBookmark {
    pub fn new(name: impl Into<String>, pose: CameraPose) -> Self {
        Self {
            id: BookmarkId::new(),
            name: name.into(),
            pose,
            created_at: Utc::now(),
            thumbnail: None,
        }
    }
}

impl Migrate for CameraBookmark {}
