use serde::{Deserialize, Serialize};
use vantage_core::{CameraPose, Vec3};

/// Distance used when the current pose has collapsed onto its target
const FALLBACK_DISTANCE: f32 = 10.0;

/// Canonical viewpoints around the current target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraViewPreset {
    Front,
    Top,
    Side,
    Iso,
    Focus,
}

impl CameraViewPreset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Front => "FRONT",
            Self::Top => "TOP",
            Self::Side => "SIDE",
            Self::Iso => "ISO",
            Self::Focus => "FOCUS",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "FRONT" => Some(Self::Front),
            "TOP" => Some(Self::Top),
            "SIDE" => Some(Self::Side),
            "ISO" | "ISOMETRIC" => Some(Self::Iso),
            "FOCUS" => Some(Self::Focus),
            _ => None,
        }
    }

    /// Pose for this preset, keeping the current target and distance.
    ///
    /// `Focus` keeps the viewing direction and moves to `focus_distance`.
    pub fn resolve(&self, current: &CameraPose, focus_distance: f32) -> CameraPose {
        let distance = match current.distance() {
            d if d > 1e-4 => d,
            _ => FALLBACK_DISTANCE,
        };
        let (direction, up) = match self {
            Self::Front => (Vec3::Z, Vec3::Y),
            Self::Top => (Vec3::Y, Vec3::NEG_Z),
            Self::Side => (Vec3::X, Vec3::Y),
            Self::Iso => (Vec3::ONE.normalize(), Vec3::Y),
            Self::Focus => (current.offset_direction().unwrap_or(Vec3::Z), current.up),
        };
        let distance = match self {
            Self::Focus => focus_distance.max(1e-3),
            _ => distance,
        };

        CameraPose {
            position: current.target + direction * distance,
            up,
            ..*current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_preserve_distance() {
        let current = CameraPose::new(Vec3::new(3.0, 4.0, 0.0), Vec3::ZERO, 50.0);
        for preset in [
            CameraViewPreset::Front,
            CameraViewPreset::Top,
            CameraViewPreset::Side,
            CameraViewPreset::Iso,
        ] {
            let pose = preset.resolve(&current, 2.0);
            assert!((pose.distance() - 5.0).abs() < 1e-4, "{}", preset.name());
            assert_eq!(pose.target, current.target);
        }
    }

    #[test]
    fn test_focus_keeps_direction() {
        let current = CameraPose::new(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO, 50.0);
        let pose = CameraViewPreset::Focus.resolve(&current, 4.0);
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 0.0, 4.0), 1e-5));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(CameraViewPreset::from_name("top"), Some(CameraViewPreset::Top));
        assert_eq!(CameraViewPreset::from_name("diagonal"), None);
    }
}
