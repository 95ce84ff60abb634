pub mod blend;
pub mod presets;
pub mod service;
pub mod trajectory;
pub mod types;

pub use blend::{blend_pose, motion_offset};
pub use presets::{MotionPreset, MotionPresetLibrary};
pub use service::MotionService;
pub use trajectory::{MotionPreview, MotionTrajectory};
pub use types::{
    BlendMode, MotionConfig, MotionParam, MotionParams, MotionPoint, MotionResult, MotionState,
    MotionStatus, MotionType,
};
