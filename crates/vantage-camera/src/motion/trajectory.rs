//! Closed-form motion trajectories
//!
//! Every generator is a pure function of elapsed time, the parameter
//! snapshot and the base pose. Nothing here keeps per-frame state, so the
//! same inputs always produce the same pose.

use std::f32::consts::TAU;

use vantage_core::math::{dolly_zoom_fov, spherical_offset};
use vantage_core::{CameraPose, Vec3};

use super::types::{MotionParams, MotionPoint, MotionResult, MotionType};

const MIN_PERIOD: f32 = 1e-3;
const DOLLY_FOV_LIMITS: (f32, f32) = (5.0, 150.0);
const SPIRAL_MIN_RADIUS: f32 = 0.4;
const ARC_MAX_LIFT: f32 = 0.35;
const ELEVATION_LIMIT: f32 = 1.4;

/// A motion generator bound to one parameter snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTrajectory {
    pub motion_type: MotionType,
    pub params: MotionParams,
    /// Seconds per cycle at speed 1
    pub base_period: f32,
    /// Follow rate of the tracking generator (per second)
    pub tracking_smoothing: f32,
}

impl MotionTrajectory {
    pub fn new(
        motion_type: MotionType,
        params: MotionParams,
        base_period: f32,
        tracking_smoothing: f32,
    ) -> Self {
        Self {
            motion_type,
            params: params.clamped(),
            base_period,
            tracking_smoothing,
        }
    }

    /// Seconds per cycle at the current speed
    pub fn period(&self) -> f32 {
        (self.base_period / self.params.speed).max(MIN_PERIOD)
    }

    /// Cyclic progress at `time`, in 0..1
    pub fn progress(&self, time: f32) -> f32 {
        (time / self.period()).rem_euclid(1.0)
    }

    /// Sample the generator at `time` seconds against `base`
    pub fn sample(&self, time: f32, base: &CameraPose) -> MotionResult {
        let theta = TAU * time / self.period();
        let p = &self.params;
        let target = base.target;

        match self.motion_type {
            MotionType::Static => MotionResult::from_pose(base),
            MotionType::Orbit => {
                let radius = p.orbit_radius * p.scale;
                let tilt = p.orbit_tilt.to_radians();
                let offset = Vec3::new(
                    radius * theta.sin(),
                    radius * theta.cos() * tilt.sin(),
                    radius * theta.cos() * tilt.cos(),
                );
                MotionResult {
                    position: target + offset,
                    target,
                    fov: base.fov,
                }
            }
            MotionType::FlyBy => {
                let (direction, distance) = self.base_frame(base);
                let right = Vec3::Y.cross(direction).try_normalize().unwrap_or(Vec3::X);
                let swing = p.fly_by_swing * p.scale;
                let height = p.fly_by_height * p.scale;
                let offset = direction * distance
                    + right * swing * theta.sin()
                    + Vec3::Y * height * (2.0 * theta).sin()
                    + direction * (0.2 * distance * theta.cos());
                MotionResult {
                    position: target + offset,
                    target,
                    fov: base.fov,
                }
            }
            MotionType::Spiral => {
                // Ping-pong so the path is continuous across cycles
                let s = 1.0 - (2.0 * self.progress(time) - 1.0).abs();
                let radius = p.orbit_radius * p.scale * (1.0 - (1.0 - SPIRAL_MIN_RADIUS) * s);
                let height = p.spiral_height * p.scale * s;
                let angle = theta * p.spiral_loops;
                let offset = Vec3::new(radius * angle.sin(), height, radius * angle.cos());
                MotionResult {
                    position: target + offset,
                    target,
                    fov: base.fov,
                }
            }
            MotionType::Arc => {
                let (direction, distance) = self.base_frame(base);
                let azimuth = direction.x.atan2(direction.z);
                let elevation = direction.y.clamp(-1.0, 1.0).asin();
                let half = (p.arc_angle * 0.5).to_radians();
                let phase = theta * p.arc_rhythm;
                let sweep = half * phase.sin();
                let lift = ARC_MAX_LIFT.min(half * 0.5) * phase.sin().abs();
                let elevation = (elevation + lift).clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
                MotionResult {
                    position: target + spherical_offset(distance, azimuth + sweep, elevation),
                    target,
                    fov: base.fov,
                }
            }
            MotionType::Tracking => {
                // Steady-state response of an exponential follow to an anchor
                // circling the target: attenuated and phase-lagged.
                let (direction, _) = self.base_frame(base);
                let omega = TAU / self.period();
                let ratio = omega / self.tracking_smoothing.max(1e-3);
                let lag = ratio.atan();
                let gain = 1.0 / (1.0 + ratio * ratio).sqrt();
                let amplitude = p.tracking_offset * p.scale;
                let phi = theta - lag;
                let follow = target
                    + Vec3::new(
                        amplitude * gain * phi.sin(),
                        0.0,
                        0.5 * amplitude * (gain * phi.cos() - 1.0),
                    );
                MotionResult {
                    position: follow + direction * p.tracking_distance * p.scale,
                    target: follow,
                    fov: base.fov,
                }
            }
            MotionType::DollyZoom => {
                let (direction, distance) = self.base_frame(base);
                let amount = p.dolly_range * p.dolly_intensity;
                let current = distance * (1.0 + amount * theta.sin());
                let fov = dolly_zoom_fov(base.fov, distance, current)
                    .clamp(DOLLY_FOV_LIMITS.0, DOLLY_FOV_LIMITS.1);
                MotionResult {
                    position: target + direction * current,
                    target,
                    fov,
                }
            }
        }
    }

    /// Lazily sample `samples + 1` evenly spaced points over `duration` seconds
    pub fn preview(&self, duration: f32, samples: usize) -> MotionPreview {
        MotionPreview {
            trajectory: *self,
            base: CameraPose::default(),
            duration: duration.max(0.0),
            samples,
            index: 0,
        }
    }

    /// Viewing direction from target to camera, and distance, of the base pose
    fn base_frame(&self, base: &CameraPose) -> (Vec3, f32) {
        match base.offset_direction() {
            Some(direction) => (direction, base.distance()),
            None => (Vec3::Z, self.params.orbit_radius * self.params.scale),
        }
    }
}

/// Finite, restartable sequence of motion samples.
///
/// Clone it to iterate again from the start.
#[derive(Debug, Clone)]
pub struct MotionPreview {
    trajectory: MotionTrajectory,
    base: CameraPose,
    duration: f32,
    samples: usize,
    index: usize,
}

impl MotionPreview {
    /// Sample against `base` instead of the default pose
    pub fn with_base(mut self, base: CameraPose) -> Self {
        self.base = base;
        self
    }

    fn time_at(&self, index: usize) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.duration * index as f32 / self.samples as f32
        }
    }
}

impl Iterator for MotionPreview {
    type Item = MotionPoint;

    fn next(&mut self) -> Option<MotionPoint> {
        if self.index > self.samples {
            return None;
        }
        let time = self.time_at(self.index);
        self.index += 1;
        let result = self.trajectory.sample(time, &self.base);
        Some(MotionPoint {
            time,
            position: result.position,
            target: result.target,
            fov: result.fov,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.samples + 1).saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for MotionPreview {}
