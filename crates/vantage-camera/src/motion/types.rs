//! Motion types, parameters and state

use serde::{Deserialize, Serialize};
use tracing::debug;
use vantage_core::{CameraPose, Vec3};

/// Procedural motion generator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionType {
    /// No procedural contribution
    #[default]
    Static,
    Orbit,
    FlyBy,
    Spiral,
    Arc,
    Tracking,
    DollyZoom,
}

impl MotionType {
    pub const ALL: [MotionType; 7] = [
        MotionType::Static,
        MotionType::Orbit,
        MotionType::FlyBy,
        MotionType::Spiral,
        MotionType::Arc,
        MotionType::Tracking,
        MotionType::DollyZoom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Orbit => "orbit",
            Self::FlyBy => "fly_by",
            Self::Spiral => "spiral",
            Self::Arc => "arc",
            Self::Tracking => "tracking",
            Self::DollyZoom => "dolly_zoom",
        }
    }

    /// Look up a generator by name; unknown names fall back to `Static`
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "static" => Self::Static,
            "orbit" => Self::Orbit,
            "flyby" => Self::FlyBy,
            "spiral" => Self::Spiral,
            "arc" => Self::Arc,
            "tracking" => Self::Tracking,
            "dollyzoom" => Self::DollyZoom,
            _ => {
                debug!("Unknown motion type '{}', using static", name);
                Self::Static
            }
        }
    }
}

/// How motion output combines with the base pose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Motion replaces position, target and fov
    #[default]
    Override,
    /// Motion offsets are added onto the base pose
    Additive,
    /// Live user input wins; motion applies only when idle
    ManualPriority,
}

impl BlendMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Additive => "additive",
            Self::ManualPriority => "manual-priority",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "override" => Some(Self::Override),
            "additive" => Some(Self::Additive),
            "manual-priority" | "manual" => Some(Self::ManualPriority),
            _ => None,
        }
    }
}

/// A single named motion knob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionParam {
    Speed,
    OrbitRadius,
    OrbitTilt,
    FlyByHeight,
    FlyBySwing,
    SpiralLoops,
    SpiralHeight,
    ArcAngle,
    ArcRhythm,
    TrackingDistance,
    TrackingOffset,
    DollyRange,
    DollyIntensity,
    Scale,
}

impl MotionParam {
    pub const ALL: [MotionParam; 14] = [
        MotionParam::Speed,
        MotionParam::OrbitRadius,
        MotionParam::OrbitTilt,
        MotionParam::FlyByHeight,
        MotionParam::FlyBySwing,
        MotionParam::SpiralLoops,
        MotionParam::SpiralHeight,
        MotionParam::ArcAngle,
        MotionParam::ArcRhythm,
        MotionParam::TrackingDistance,
        MotionParam::TrackingOffset,
        MotionParam::DollyRange,
        MotionParam::DollyIntensity,
        MotionParam::Scale,
    ];

    /// Look up a knob by its camelCase or snake_case name
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL.into_iter().find(|param| param.key() == key)
    }

    fn key(&self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::OrbitRadius => "orbitradius",
            Self::OrbitTilt => "orbittilt",
            Self::FlyByHeight => "flybyheight",
            Self::FlyBySwing => "flybyswing",
            Self::SpiralLoops => "spiralloops",
            Self::SpiralHeight => "spiralheight",
            Self::ArcAngle => "arcangle",
            Self::ArcRhythm => "arcrhythm",
            Self::TrackingDistance => "trackingdistance",
            Self::TrackingOffset => "trackingoffset",
            Self::DollyRange => "dollyrange",
            Self::DollyIntensity => "dollyintensity",
            Self::Scale => "scale",
        }
    }

    /// Safe inclusive range for this knob
    pub fn range(&self) -> (f32, f32) {
        match self {
            Self::Speed => (0.05, 10.0),
            Self::OrbitRadius => (0.5, 500.0),
            Self::OrbitTilt => (-85.0, 85.0),
            Self::FlyByHeight => (-100.0, 100.0),
            Self::FlyBySwing => (0.0, 200.0),
            Self::SpiralLoops => (0.25, 12.0),
            Self::SpiralHeight => (0.0, 200.0),
            Self::ArcAngle => (5.0, 360.0),
            Self::ArcRhythm => (0.1, 8.0),
            Self::TrackingDistance => (0.5, 500.0),
            Self::TrackingOffset => (-100.0, 100.0),
            Self::DollyRange => (0.05, 0.9),
            Self::DollyIntensity => (0.0, 1.0),
            Self::Scale => (0.1, 10.0),
        }
    }
}

/// Numeric knobs consumed by the motion generators.
///
/// Angles are in degrees. Setters clamp into [`MotionParam::range`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MotionParams {
    pub speed: f32,
    pub orbit_radius: f32,
    pub orbit_tilt: f32,
    pub fly_by_height: f32,
    pub fly_by_swing: f32,
    pub spiral_loops: f32,
    pub spiral_height: f32,
    pub arc_angle: f32,
    pub arc_rhythm: f32,
    pub tracking_distance: f32,
    pub tracking_offset: f32,
    pub dolly_range: f32,
    pub dolly_intensity: f32,
    pub scale: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            orbit_radius: 10.0,
            orbit_tilt: 20.0,
            fly_by_height: 3.0,
            fly_by_swing: 8.0,
            spiral_loops: 2.0,
            spiral_height: 4.0,
            arc_angle: 90.0,
            arc_rhythm: 1.0,
            tracking_distance: 6.0,
            tracking_offset: 2.0,
            dolly_range: 0.4,
            dolly_intensity: 1.0,
            scale: 1.0,
        }
    }
}

impl MotionParams {
    pub fn get(&self, param: MotionParam) -> f32 {
        *self.field(param)
    }

    /// Set one knob, clamped to its safe range; non-finite values are ignored
    pub fn set(&mut self, param: MotionParam, value: f32) -> bool {
        if !value.is_finite() {
            debug!(?param, "ignoring non-finite motion parameter");
            return false;
        }
        let (min, max) = param.range();
        *self.field_mut(param) = value.clamp(min, max);
        true
    }

    /// Copy with every knob clamped into range
    pub fn clamped(&self) -> Self {
        let mut params = Self::default();
        for param in MotionParam::ALL {
            params.set(param, self.get(param));
        }
        params
    }

    fn field(&self, param: MotionParam) -> &f32 {
        match param {
            MotionParam::Speed => &self.speed,
            MotionParam::OrbitRadius => &self.orbit_radius,
            MotionParam::OrbitTilt => &self.orbit_tilt,
            MotionParam::FlyByHeight => &self.fly_by_height,
            MotionParam::FlyBySwing => &self.fly_by_swing,
            MotionParam::SpiralLoops => &self.spiral_loops,
            MotionParam::SpiralHeight => &self.spiral_height,
            MotionParam::ArcAngle => &self.arc_angle,
            MotionParam::ArcRhythm => &self.arc_rhythm,
            MotionParam::TrackingDistance => &self.tracking_distance,
            MotionParam::TrackingOffset => &self.tracking_offset,
            MotionParam::DollyRange => &self.dolly_range,
            MotionParam::DollyIntensity => &self.dolly_intensity,
            MotionParam::Scale => &self.scale,
        }
    }

    fn field_mut(&mut self, param: MotionParam) -> &mut f32 {
        match param {
            MotionParam::Speed => &mut self.speed,
            MotionParam::OrbitRadius => &mut self.orbit_radius,
            MotionParam::OrbitTilt => &mut self.orbit_tilt,
            MotionParam::FlyByHeight => &mut self.fly_by_height,
            MotionParam::FlyBySwing => &mut self.fly_by_swing,
            MotionParam::SpiralLoops => &mut self.spiral_loops,
            MotionParam::SpiralHeight => &mut self.spiral_height,
            MotionParam::ArcAngle => &mut self.arc_angle,
            MotionParam::ArcRhythm => &mut self.arc_rhythm,
            MotionParam::TrackingDistance => &mut self.tracking_distance,
            MotionParam::TrackingOffset => &mut self.tracking_offset,
            MotionParam::DollyRange => &mut self.dolly_range,
            MotionParam::DollyIntensity => &mut self.dolly_intensity,
            MotionParam::Scale => &mut self.scale,
        }
    }
}

/// Parameters passed to [`MotionService::start`](super::MotionService::start)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub params: MotionParams,
    pub blend_mode: BlendMode,
}

impl MotionConfig {
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MotionStatus {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Snapshot of the motion lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionState {
    pub is_active: bool,
    pub is_paused: bool,
    pub motion_type: MotionType,
    /// Cyclic progress through the current period, 0..1
    pub progress: f32,
    /// Seconds of motion time elapsed since start
    pub elapsed: f32,
    /// Clock time (ms) at which the motion was started
    pub start_time: f64,
}

impl MotionState {
    pub fn status(&self) -> MotionStatus {
        match (self.is_active, self.is_paused) {
            (false, _) => MotionStatus::Stopped,
            (true, true) => MotionStatus::Paused,
            (true, false) => MotionStatus::Running,
        }
    }
}

/// Candidate pose produced by a motion generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionResult {
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
}

impl MotionResult {
    pub fn from_pose(pose: &CameraPose) -> Self {
        Self {
            position: pose.position,
            target: pose.target,
            fov: pose.fov,
        }
    }

    /// Base pose with position, target and fov replaced
    pub fn apply_to(&self, base: &CameraPose) -> CameraPose {
        CameraPose {
            position: self.position,
            target: self.target,
            fov: self.fov,
            ..*base
        }
    }
}

/// One sample of a motion preview
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPoint {
    pub time: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
}
