pub mod projection;
pub mod service;

pub use projection::{DistanceLimits, ProjectionCameraPreset, ProjectionMode};
pub use service::{
    CameraTransitionService, TransitionFrame, TransitionOptions, TransitionPath, TransitionState,
};
