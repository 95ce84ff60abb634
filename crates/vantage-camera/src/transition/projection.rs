//! Projection modes and their camera constraints

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Surface the scene is projected onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectionMode {
    Plane,
    Sphere,
    Cylinder,
    Cube,
    Dome,
    Panorama,
    InfiniteBox,
    Corner,
    GaussianSplat,
}

impl ProjectionMode {
    pub const ALL: [ProjectionMode; 9] = [
        ProjectionMode::Plane,
        ProjectionMode::Sphere,
        ProjectionMode::Cylinder,
        ProjectionMode::Cube,
        ProjectionMode::Dome,
        ProjectionMode::Panorama,
        ProjectionMode::InfiniteBox,
        ProjectionMode::Corner,
        ProjectionMode::GaussianSplat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Plane => "plane",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Cube => "cube",
            Self::Dome => "dome",
            Self::Panorama => "panorama",
            Self::InfiniteBox => "infinite-box",
            Self::Corner => "corner",
            Self::GaussianSplat => "gaussian-splat",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "plane" | "flat" => Some(Self::Plane),
            "sphere" => Some(Self::Sphere),
            "cylinder" => Some(Self::Cylinder),
            "cube" => Some(Self::Cube),
            "dome" => Some(Self::Dome),
            "panorama" => Some(Self::Panorama),
            "infinitebox" => Some(Self::InfiniteBox),
            "corner" | "cornercave" => Some(Self::Corner),
            "gaussiansplat" | "splat" => Some(Self::GaussianSplat),
            _ => None,
        }
    }

    /// Whether the projection surrounds the viewer
    pub fn is_immersive(&self) -> bool {
        self.camera_preset().immersive
    }

    pub fn camera_preset(&self) -> ProjectionCameraPreset {
        ProjectionCameraPreset::for_mode(*self)
    }
}

/// Allowed camera-to-target distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceLimits {
    pub min: f32,
    pub max: f32,
}

impl DistanceLimits {
    pub fn clamp(&self, distance: f32) -> f32 {
        distance.clamp(self.min, self.max)
    }

    pub fn contains(&self, distance: f32) -> bool {
        distance >= self.min && distance <= self.max
    }
}

/// Camera constraints for one projection mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionCameraPreset {
    pub ideal_distance: f32,
    pub ideal_fov: f32,
    pub distance_limits: DistanceLimits,
    /// Direction from target to camera used when the current one is degenerate
    pub position_hint: Vec3,
    pub immersive: bool,
    /// Look target of immersive modes; offset added to the current target otherwise
    pub target_offset: Vec3,
}

impl ProjectionCameraPreset {
    pub fn for_mode(mode: ProjectionMode) -> Self {
        let (ideal_distance, ideal_fov, min, max, immersive) = match mode {
            ProjectionMode::Plane => (10.0, 50.0, 2.0, 50.0, false),
            ProjectionMode::GaussianSplat => (5.0, 60.0, 0.5, 30.0, false),
            ProjectionMode::Sphere => (0.5, 75.0, 0.1, 2.0, true),
            ProjectionMode::Cylinder => (0.5, 70.0, 0.1, 2.5, true),
            ProjectionMode::Cube => (0.5, 75.0, 0.1, 2.0, true),
            ProjectionMode::Dome => (1.0, 80.0, 0.2, 3.0, true),
            ProjectionMode::Panorama => (0.3, 75.0, 0.1, 1.5, true),
            ProjectionMode::InfiniteBox => (1.0, 70.0, 0.2, 4.0, true),
            ProjectionMode::Corner => (2.0, 65.0, 0.5, 5.0, true),
        };
        let position_hint = match mode {
            ProjectionMode::Corner => Vec3::new(1.0, 0.5, 1.0).normalize(),
            ProjectionMode::Dome => Vec3::new(0.0, -0.3, 1.0).normalize(),
            _ => Vec3::Z,
        };
        let target_offset = match mode {
            ProjectionMode::Dome => Vec3::new(0.0, 1.0, 0.0),
            _ => Vec3::ZERO,
        };
        Self {
            ideal_distance,
            ideal_fov,
            distance_limits: DistanceLimits { min, max },
            position_hint,
            immersive,
            target_offset,
        }
    }
}
