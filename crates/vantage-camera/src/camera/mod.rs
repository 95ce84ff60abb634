//! Authoritative camera pose store
//!
//! Owns the current pose, the undo/redo history, and named bookmarks.

mod bookmark;
mod history;
mod preset;
mod service;

pub use bookmark::{BookmarkId, CameraBookmark};
pub use history::History;
pub use preset::CameraViewPreset;
pub use service::{CameraService, SetPoseOptions};
