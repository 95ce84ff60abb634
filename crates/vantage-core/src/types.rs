//! Camera pose types shared by every service

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::math::{lerp, Lerp};

/// Full extrinsic and intrinsic state of a camera at an instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    /// Point the camera looks at
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub near: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub far: Option<f32>,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 50.0,
            near: None,
            far: None,
        }
    }
}

impl CameraPose {
    /// Create a pose looking from `position` at `target` with a Y-up vector
    pub fn new(position: Vec3, target: Vec3, fov: f32) -> Self {
        Self {
            position,
            target,
            fov,
            ..Default::default()
        }
    }

    /// Distance between the camera and its look target
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Unit vector from the target towards the camera, or `None` when they coincide
    pub fn offset_direction(&self) -> Option<Vec3> {
        (self.position - self.target).try_normalize()
    }

    /// Unit vector the camera is looking along
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Get a perspective projection matrix using the pose clip planes
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        let near = self.near.unwrap_or(0.1);
        let far = self.far.unwrap_or(1000.0);
        Mat4::perspective_rh(self.fov.to_radians(), aspect_ratio, near, far)
    }

    /// Merge a partial update into a copy of this pose
    pub fn merged(&self, patch: &PosePatch) -> CameraPose {
        CameraPose {
            position: patch.position.unwrap_or(self.position),
            target: patch.target.unwrap_or(self.target),
            up: patch.up.unwrap_or(self.up),
            fov: patch.fov.unwrap_or(self.fov),
            near: patch.near.or(self.near),
            far: patch.far.or(self.far),
        }
    }

    /// Check whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.target.is_finite()
            && self.up.is_finite()
            && self.fov.is_finite()
    }

    /// Compare two poses with an absolute tolerance on every component
    pub fn abs_diff_eq(&self, other: &CameraPose, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && self.target.abs_diff_eq(other.target, max_abs_diff)
            && self.up.abs_diff_eq(other.up, max_abs_diff)
            && (self.fov - other.fov).abs() <= max_abs_diff
    }
}

impl Lerp for CameraPose {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        CameraPose {
            position: a.position.lerp(b.position, t),
            target: a.target.lerp(b.target, t),
            up: a.up.lerp(b.up, t).try_normalize().unwrap_or(b.up),
            fov: lerp(a.fov, b.fov, t),
            near: lerp_optional(a.near, b.near, t),
            far: lerp_optional(a.far, b.far, t),
        }
    }
}

fn lerp_optional(a: Option<f32>, b: Option<f32>, t: f32) -> Option<f32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b, t)),
        (a, b) => b.or(a),
    }
}

/// Partial pose update; `None` fields keep their current value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PosePatch {
    pub position: Option<Vec3>,
    pub target: Option<Vec3>,
    pub up: Option<Vec3>,
    pub fov: Option<f32>,
    pub near: Option<f32>,
    pub far: Option<f32>,
}

impl PosePatch {
    pub fn position(position: Vec3) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn target(target: Vec3) -> Self {
        Self {
            target: Some(target),
            ..Default::default()
        }
    }

    pub fn fov(fov: f32) -> Self {
        Self {
            fov: Some(fov),
            ..Default::default()
        }
    }

    /// A patch that replaces every field of the pose
    pub fn full(pose: &CameraPose) -> Self {
        Self {
            position: Some(pose.position),
            target: Some(pose.target),
            up: Some(pose.up),
            fov: Some(pose.fov),
            near: pose.near,
            far: pose.far,
        }
    }

    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = Some(up);
        self
    }

    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = Some(fov);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<CameraPose> for PosePatch {
    fn from(pose: CameraPose) -> Self {
        Self::full(&pose)
    }
}
