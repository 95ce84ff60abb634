//! Engine configuration

use serde::{Deserialize, Serialize};
use vantage_core::{CameraPose, ClockConfig, Easing};

use crate::motion::{BlendMode, MotionParams};

/// Top-level configuration for a [`CameraContext`](crate::CameraContext)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_pose: CameraPose,
    pub clock: ClockConfig,
    pub camera: CameraServiceConfig,
    pub animator: AnimatorConfig,
    pub motion: MotionDefaults,
    pub transition: TransitionConfig,
}

/// Camera service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraServiceConfig {
    /// Maximum number of history entries kept for undo/redo
    pub history_limit: usize,
    /// Duration of scripted moves when the caller gives none (seconds)
    pub default_duration: f32,
    /// Duration of view preset jumps (seconds)
    pub preset_duration: f32,
    /// Camera-to-target distance used by the focus preset
    pub focus_distance: f32,
    /// Curve used for animated pose changes
    pub default_easing: Easing,
}

impl Default for CameraServiceConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            default_duration: 0.8,
            preset_duration: 1.0,
            focus_distance: 4.0,
            default_easing: Easing::EaseOutCubic,
        }
    }
}

/// Frame integration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Idle time after an interaction ends before motion comes back
    pub motion_resume_delay_ms: f64,
    /// Time over which motion is blended back in after the delay
    pub motion_resume_transition_ms: f64,
    /// Scale applied to motion offsets in additive blending
    pub additive_factor: f32,
    /// FOV at which an orthographic sink has zoom 1
    pub orthographic_reference_fov: f32,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            motion_resume_delay_ms: 1500.0,
            motion_resume_transition_ms: 800.0,
            additive_factor: 0.35,
            orthographic_reference_fov: 50.0,
        }
    }
}

/// Defaults for the procedural motion sampler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionDefaults {
    /// Seconds per motion cycle at speed 1
    pub base_period: f32,
    /// Exponential smoothing rate of the tracking follow (per second)
    pub tracking_smoothing: f32,
    /// Minimum seconds between progress events
    pub progress_event_interval: f32,
    pub params: MotionParams,
    pub blend_mode: BlendMode,
}

impl Default for MotionDefaults {
    fn default() -> Self {
        Self {
            base_period: 30.0,
            tracking_smoothing: 2.0,
            progress_event_interval: 0.25,
            params: MotionParams::default(),
            blend_mode: BlendMode::default(),
        }
    }
}

/// Projection-mode transition timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Between two planar modes (seconds)
    pub planar_duration: f32,
    /// Entering or leaving an immersive mode (seconds)
    pub immersive_change_duration: f32,
    /// Between two immersive modes (seconds)
    pub immersive_swap_duration: f32,
    pub easing: Easing,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            planar_duration: 0.8,
            immersive_change_duration: 1.5,
            immersive_swap_duration: 1.2,
            easing: Easing::EaseInOutCubic,
        }
    }
}
