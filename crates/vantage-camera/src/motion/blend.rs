//! Combining motion output with a base pose

use vantage_core::CameraPose;

use super::types::{BlendMode, MotionResult};

/// Component-wise difference between the motion output and the base pose,
/// scaled by `factor`
pub fn motion_offset(base: &CameraPose, motion: &MotionResult, factor: f32) -> MotionResult {
    MotionResult {
        position: (motion.position - base.position) * factor,
        target: (motion.target - base.target) * factor,
        fov: (motion.fov - base.fov) * factor,
    }
}

/// Apply `mode` to combine `motion` with `base`.
///
/// `base` is the last manual pose; while `interacting` it is also the live
/// manually-driven pose.
pub fn blend_pose(
    mode: BlendMode,
    base: &CameraPose,
    motion: &MotionResult,
    additive_factor: f32,
    interacting: bool,
) -> CameraPose {
    match mode {
        BlendMode::Override => motion.apply_to(base),
        BlendMode::Additive => {
            let offset = motion_offset(base, motion, additive_factor);
            CameraPose {
                position: base.position + offset.position,
                target: base.target + offset.target,
                fov: base.fov + offset.fov,
                ..*base
            }
        }
        BlendMode::ManualPriority if interacting => *base,
        BlendMode::ManualPriority => motion.apply_to(base),
    }
}
