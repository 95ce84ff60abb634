//! Projection-mode aware camera retargeting

use std::fmt;

use tracing::{debug, info};
use vantage_anim::{AnimationService, CompleteFn, Tween, TweenOptions};
use vantage_core::math::lerp;
use vantage_core::{CameraPose, Easing, Vec3};

use super::projection::{DistanceLimits, ProjectionMode};
use crate::config::TransitionConfig;
use crate::events::{CameraEvent, EventBus};

/// Options for a projection transition
#[derive(Default)]
pub struct TransitionOptions {
    /// Overrides the mode-dependent duration (seconds)
    pub duration: Option<f32>,
    pub easing: Option<Easing>,
    on_complete: Option<CompleteFn>,
}

impl fmt::Debug for TransitionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionOptions")
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .finish_non_exhaustive()
    }
}

impl TransitionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    /// Called once the transition settles; not called when canceled
    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Keyframe {
    at: f32,
    target: Vec3,
    direction: Vec3,
    distance: f32,
    fov: f32,
    up: Vec3,
}

impl Keyframe {
    fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.target + self.direction * self.distance,
            target: self.target,
            up: self.up,
            fov: self.fov,
            near: None,
            far: None,
        }
    }
}

/// Keyframed camera path for one transition.
///
/// Sampling interpolates target, direction and distance separately, so the
/// camera swings around the target instead of cutting through it, and
/// clamps distance into the destination limits at every sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPath {
    keyframes: Vec<Keyframe>,
    limits: DistanceLimits,
}

impl TransitionPath {
    pub fn limits(&self) -> DistanceLimits {
        self.limits
    }

    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    /// Final pose of the path
    pub fn end(&self) -> CameraPose {
        self.sample(1.0)
    }

    /// Pose at eased progress `t` in 0..1
    pub fn sample(&self, t: f32) -> CameraPose {
        let t = t.clamp(0.0, 1.0);
        let segment = self
            .keyframes
            .windows(2)
            .find(|pair| t <= pair[1].at)
            .or_else(|| self.keyframes.windows(2).last());
        let Some([a, b]) = segment else {
            return self.keyframes.first().map(Keyframe::pose).unwrap_or_default();
        };

        let span = (b.at - a.at).max(f32::EPSILON);
        let u = ((t - a.at) / span).clamp(0.0, 1.0);
        let direction = a
            .direction
            .lerp(b.direction, u)
            .try_normalize()
            .unwrap_or(b.direction);
        let distance = self.limits.clamp(lerp(a.distance, b.distance, u));
        let target = a.target.lerp(b.target, u);

        CameraPose {
            position: target + direction * distance,
            target,
            up: a.up.lerp(b.up, u).try_normalize().unwrap_or(b.up),
            fov: lerp(a.fov, b.fov, u),
            near: None,
            far: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Idle,
    Transitioning,
}

/// Output of [`CameraTransitionService::poll`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionFrame {
    pub pose: CameraPose,
    pub mode: ProjectionMode,
    /// Eased progress, 0..1
    pub progress: f32,
    /// Set on the frame the transition settles
    pub finished: bool,
}

struct ActiveTransition {
    mode: ProjectionMode,
    path: TransitionPath,
    tween: Tween<f32>,
    on_complete: Option<CompleteFn>,
}

/// Drives camera transitions when the projection mode changes.
///
/// The latest request wins: a new request cancels the one in flight.
pub struct CameraTransitionService {
    config: TransitionConfig,
    animations: AnimationService,
    events: EventBus,
    active: Option<ActiveTransition>,
    last_mode: Option<ProjectionMode>,
}

impl CameraTransitionService {
    pub fn new(config: TransitionConfig, animations: AnimationService, events: EventBus) -> Self {
        Self {
            config,
            animations,
            events,
            active: None,
            last_mode: None,
        }
    }

    /// Start a transition from the given camera state.
    ///
    /// Returns `false` when `mode` is the settled current mode.
    pub fn transition_to_projection(
        &mut self,
        mode: ProjectionMode,
        from_position: Vec3,
        from_target: Vec3,
        from_fov: f32,
        options: TransitionOptions,
    ) -> bool {
        let from = CameraPose::new(from_position, from_target, from_fov);
        self.transition_from_pose(mode, &from, options)
    }

    pub fn transition_from_pose(
        &mut self,
        mode: ProjectionMode,
        from: &CameraPose,
        options: TransitionOptions,
    ) -> bool {
        if self.active.is_none() && self.last_mode == Some(mode) {
            debug!(mode = mode.name(), "already in projection mode");
            return false;
        }
        self.cancel_transition();

        let path = self.plan(mode, from);
        let duration = options
            .duration
            .unwrap_or_else(|| self.duration_for(self.last_mode, mode));
        let easing = options.easing.unwrap_or(self.config.easing);
        let tween = self
            .animations
            .animate_number(0.0, 1.0, TweenOptions::new(duration).easing(easing));

        info!(
            "Projection transition {} -> {} over {:.2}s",
            self.last_mode.map_or("none", |m| m.name()),
            mode.name(),
            duration
        );
        self.events.emit(CameraEvent::TransitionStarted {
            from: self.last_mode,
            to: mode,
        });
        self.active = Some(ActiveTransition {
            mode,
            path,
            tween,
            on_complete: options.on_complete,
        });
        true
    }

    /// Compute the keyframed path from `from` into `mode`
    pub fn plan(&self, mode: ProjectionMode, from: &CameraPose) -> TransitionPath {
        let preset = mode.camera_preset();
        let limits = preset.distance_limits;
        let from_immersive = self.last_mode.is_some_and(|m| m.is_immersive());
        let class_change = from_immersive != preset.immersive;

        let direction = from.offset_direction().unwrap_or(preset.position_hint);
        let target = if preset.immersive || from_immersive {
            preset.target_offset
        } else {
            from.target + preset.target_offset
        };
        let distance = if class_change {
            preset.ideal_distance
        } else {
            limits.clamp(from.distance())
        };
        let fov = if preset.immersive || from_immersive {
            preset.ideal_fov
        } else {
            from.fov
        };

        let start = Keyframe {
            at: 0.0,
            target: from.target,
            direction,
            distance: from.distance(),
            fov: from.fov,
            up: from.up,
        };
        let end = Keyframe {
            at: 1.0,
            target,
            direction,
            distance,
            fov,
            up: from.up,
        };

        let keyframes = if class_change {
            // Settle distance and fov around the old target first, then move
            // over to the new one.
            let mid = Keyframe {
                at: 0.5,
                target: from.target,
                ..end
            };
            vec![start, mid, end]
        } else {
            vec![start, end]
        };

        TransitionPath { keyframes, limits }
    }

    /// Duration for a change between two modes
    pub fn duration_for(&self, from: Option<ProjectionMode>, to: ProjectionMode) -> f32 {
        let from_immersive = from.is_some_and(|m| m.is_immersive());
        match (from_immersive, to.is_immersive()) {
            (false, false) => self.config.planar_duration,
            (true, true) => self.config.immersive_swap_duration,
            _ => self.config.immersive_change_duration,
        }
    }

    /// Current pose of the in-flight transition; settles it when finished
    pub fn poll(&mut self) -> Option<TransitionFrame> {
        let active = self.active.as_ref()?;
        let progress = active.tween.value();
        let pose = active.path.sample(progress);
        let mode = active.mode;
        let finished = !self.animations.is_active(active.tween.handle());

        if finished {
            if let Some(active) = self.active.take() {
                self.last_mode = Some(active.mode);
                info!("Projection transition to {} completed", mode.name());
                self.events.emit(CameraEvent::TransitionCompleted { mode });
                if let Some(on_complete) = active.on_complete {
                    on_complete();
                }
            }
        }

        Some(TransitionFrame {
            pose,
            mode,
            progress,
            finished,
        })
    }

    /// Stop the in-flight transition where it is
    pub fn cancel_transition(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        self.animations.cancel(active.tween.handle(), false);
        info!("Projection transition to {} cancelled", active.mode.name());
        self.events
            .emit(CameraEvent::TransitionCancelled { mode: active.mode });
        true
    }

    /// Pose at the last computed progress of the in-flight transition
    pub fn current_pose(&self) -> Option<CameraPose> {
        self.active
            .as_ref()
            .map(|active| active.path.sample(active.tween.value()))
    }

    pub fn is_transitioning(&self) -> bool {
        self.active.is_some()
    }

    pub fn state(&self) -> TransitionState {
        if self.active.is_some() {
            TransitionState::Transitioning
        } else {
            TransitionState::Idle
        }
    }

    /// Mode being transitioned into, if any
    pub fn target_mode(&self) -> Option<ProjectionMode> {
        self.active.as_ref().map(|active| active.mode)
    }

    pub fn last_projection_mode(&self) -> Option<ProjectionMode> {
        self.last_mode
    }

    /// Record the mode the scene is in without animating
    pub fn set_last_projection_mode(&mut self, mode: Option<ProjectionMode>) {
        self.last_mode = mode;
    }

    /// Drop any transition silently and forget the last mode
    pub fn reset(&mut self) {
        if let Some(active) = self.active.take() {
            self.animations.cancel(active.tween.handle(), false);
        }
        self.last_mode = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn service() -> (CameraTransitionService, AnimationService, EventBus) {
        let animations = AnimationService::new();
        let events = EventBus::new();
        let transitions =
            CameraTransitionService::new(TransitionConfig::default(), animations.clone(), events.clone());
        (transitions, animations, events)
    }

    fn plane_pose() -> CameraPose {
        CameraPose::new(Vec3::new(3.0, 4.0, 12.0), Vec3::new(1.0, 0.0, 0.0), 45.0)
    }

    fn run(transitions: &mut CameraTransitionService, animations: &AnimationService) -> Vec<TransitionFrame> {
        let mut frames = Vec::new();
        for _ in 0..400 {
            animations.tick(1.0 / 60.0);
            match transitions.poll() {
                Some(frame) => {
                    frames.push(frame);
                    if frame.finished {
                        break;
                    }
                }
                None => break,
            }
        }
        frames
    }

    #[test]
    fn test_sphere_distance_stays_in_limits() {
        let (mut transitions, animations, _) = service();
        transitions.set_last_projection_mode(Some(ProjectionMode::Plane));
        let from = plane_pose();
        assert!(transitions.transition_from_pose(ProjectionMode::Sphere, &from, TransitionOptions::new()));

        let limits = ProjectionMode::Sphere.camera_preset().distance_limits;
        let path = transitions.plan(ProjectionMode::Sphere, &from);
        for i in 0..=100 {
            let d = path.sample(i as f32 / 100.0).distance();
            assert!(d >= limits.min - 1e-4 && d <= limits.max + 1e-4, "sample {i}: {d}");
        }

        let frames = run(&mut transitions, &animations);
        assert!(frames.last().is_some_and(|f| f.finished));
        for frame in &frames {
            let d = frame.pose.distance();
            assert!(d >= limits.min - 1e-4 && d <= limits.max + 1e-4);
        }
        assert_eq!(transitions.last_projection_mode(), Some(ProjectionMode::Sphere));
    }

    #[test]
    fn test_entering_immersive_uses_ideal_values() {
        let (mut transitions, _, _) = service();
        transitions.set_last_projection_mode(Some(ProjectionMode::Plane));
        let from = plane_pose();
        let path = transitions.plan(ProjectionMode::Dome, &from);
        let preset = ProjectionMode::Dome.camera_preset();
        let end = path.end();

        assert_eq!(path.keyframe_count(), 3);
        assert!((end.distance() - preset.ideal_distance).abs() < 1e-4);
        assert!((end.fov - preset.ideal_fov).abs() < 1e-4);
        assert!(end.target.abs_diff_eq(preset.target_offset, 1e-5));
        // Viewing direction is kept
        let before = from.offset_direction().unwrap();
        let after = end.offset_direction().unwrap();
        assert!(before.abs_diff_eq(after, 1e-4));
    }

    #[test]
    fn test_planar_change_clamps_distance() {
        let (mut transitions, _, _) = service();
        transitions.set_last_projection_mode(Some(ProjectionMode::Plane));
        let far = CameraPose::new(Vec3::new(0.0, 0.0, 45.0), Vec3::ZERO, 40.0);
        let end = transitions.plan(ProjectionMode::GaussianSplat, &far).end();
        assert!((end.distance() - 30.0).abs() < 1e-3);
        assert_eq!(end.fov, 40.0);
    }

    #[test]
    fn test_durations_depend_on_mode_class() {
        let (transitions, _, _) = service();
        let config = TransitionConfig::default();
        assert_eq!(
            transitions.duration_for(Some(ProjectionMode::Plane), ProjectionMode::GaussianSplat),
            config.planar_duration
        );
        assert_eq!(
            transitions.duration_for(Some(ProjectionMode::Plane), ProjectionMode::Sphere),
            config.immersive_change_duration
        );
        assert_eq!(
            transitions.duration_for(Some(ProjectionMode::Cube), ProjectionMode::Dome),
            config.immersive_swap_duration
        );
    }

    #[test]
    fn test_same_mode_is_not_retriggered() {
        let (mut transitions, _, _) = service();
        transitions.set_last_projection_mode(Some(ProjectionMode::Cube));
        assert!(!transitions.transition_from_pose(
            ProjectionMode::Cube,
            &plane_pose(),
            TransitionOptions::new()
        ));
        assert!(!transitions.is_transitioning());
    }

    #[test]
    fn test_new_request_cancels_previous() {
        let (mut transitions, animations, events) = service();
        let names = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&names);
        let _sub = events.subscribe_to("transition:", move |e| log.borrow_mut().push(e.name()));

        let completed = Rc::new(Cell::new(0));
        let (a, b) = (Rc::clone(&completed), Rc::clone(&completed));
        transitions.transition_from_pose(
            ProjectionMode::Sphere,
            &plane_pose(),
            TransitionOptions::new().on_complete(move || a.set(a.get() + 1)),
        );
        animations.tick(0.2);
        transitions.poll();
        transitions.transition_from_pose(
            ProjectionMode::Cylinder,
            &plane_pose(),
            TransitionOptions::new().on_complete(move || b.set(b.get() + 10)),
        );
        assert_eq!(transitions.target_mode(), Some(ProjectionMode::Cylinder));
        assert_eq!(animations.active_animations().len(), 1);

        run(&mut transitions, &animations);
        assert_eq!(completed.get(), 10);
        assert_eq!(
            *names.borrow(),
            vec![
                "transition:started",
                "transition:cancelled",
                "transition:started",
                "transition:completed",
            ]
        );
    }

    #[test]
    fn test_cancel_holds_last_pose() {
        let (mut transitions, animations, _) = service();
        transitions.transition_from_pose(ProjectionMode::Panorama, &plane_pose(), TransitionOptions::new());
        animations.tick(0.4);
        let frame = transitions.poll().unwrap();
        assert!(!frame.finished);

        assert!(transitions.cancel_transition());
        assert!(!transitions.is_transitioning());
        assert!(transitions.poll().is_none());
        assert_eq!(transitions.last_projection_mode(), None);
        assert!(frame.pose.is_finite());
        assert!(!transitions.cancel_transition());
    }
}
