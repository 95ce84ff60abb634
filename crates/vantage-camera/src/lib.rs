//! Vantage Camera - Camera control and motion synthesis
//!
//! This crate owns the camera pose of a 3D viewer and decides how it evolves
//! every frame:
//! - `CameraService`: the single writer of the pose, with history and bookmarks
//! - `MotionService`: closed-form procedural motion (orbit, fly-by, ...)
//! - `CameraTransitionService`: retargeting when the projection mode changes
//! - `CameraAnimator`: per-frame arbitration between user input, scripted
//!   moves, transitions and motion
//! - `CameraContext`: wires all of the above for one viewport

pub mod animator;
pub mod camera;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod motion;
pub mod persistence;
pub mod transition;

pub use animator::{CameraAnimator, CameraSink, RecordingSink};
pub use camera::{BookmarkId, CameraBookmark, CameraService, CameraViewPreset, History, SetPoseOptions};
pub use config::{AnimatorConfig, CameraServiceConfig, EngineConfig, MotionDefaults, TransitionConfig};
pub use context::CameraContext;
pub use error::{CameraError, StorageError};
pub use events::{CameraEvent, EventBus, PoseSource, Subscription};
pub use motion::{
    BlendMode, MotionConfig, MotionParam, MotionParams, MotionPreset, MotionPresetLibrary,
    MotionResult, MotionService, MotionState, MotionStatus, MotionType,
};
pub use persistence::{FileStore, KeyValueStore, MemoryStore};
pub use transition::{
    CameraTransitionService, ProjectionCameraPreset, ProjectionMode, TransitionOptions,
};
