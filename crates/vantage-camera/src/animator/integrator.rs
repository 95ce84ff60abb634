//! Per-frame camera integration
//!
//! Within one frame the input state is applied first, then scripted moves
//! and projection transitions get the pose if they are running, and only
//! otherwise is procedural motion sampled and blended. Exactly one pose is
//! written per frame.

use tracing::{debug, info, warn};
use vantage_anim::AnimationService;
use vantage_core::math::fov_to_zoom;
use vantage_core::{CameraPose, Easing, Lerp, PosePatch, Vec3};

use super::sink::CameraSink;
use crate::camera::{CameraService, SetPoseOptions};
use crate::config::{AnimatorConfig, EngineConfig};
use crate::error::CameraError;
use crate::events::{CameraEvent, EventBus, PoseSource};
use crate::motion::{blend_pose, BlendMode, MotionService};
use crate::transition::{CameraTransitionService, ProjectionMode, TransitionOptions};

/// Delay before motion blends back in, measured on the frame clock
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResumeTimer {
    armed_at_ms: f64,
    delay_ms: f64,
}

/// Merges manual input, scripted moves, projection transitions and
/// procedural motion into the pose applied to the render surface.
pub struct CameraAnimator {
    config: AnimatorConfig,
    camera: CameraService,
    motion: MotionService,
    transitions: CameraTransitionService,
    animations: AnimationService,
    events: EventBus,
    sink: Option<Box<dyn CameraSink>>,
    interacting: bool,
    resume: Option<ResumeTimer>,
    /// Last pose not produced by motion; motion is sampled around it
    base_pose: CameraPose,
    seen_revision: u64,
    now_ms: f64,
}

impl CameraAnimator {
    pub fn new(config: &EngineConfig, animations: AnimationService, events: EventBus) -> Self {
        let camera = CameraService::new(
            config.initial_pose,
            config.camera.clone(),
            animations.clone(),
            events.clone(),
        );
        let motion = MotionService::new(config.motion.clone(), events.clone());
        let transitions = CameraTransitionService::new(
            config.transition.clone(),
            animations.clone(),
            events.clone(),
        );
        Self {
            config: config.animator.clone(),
            base_pose: *camera.pose(),
            seen_revision: camera.revision(),
            camera,
            motion,
            transitions,
            animations,
            events,
            sink: None,
            interacting: false,
            resume: None,
            now_ms: 0.0,
        }
    }

    /// Attach the render surface and push the current pose onto it
    pub fn bind(&mut self, sink: Box<dyn CameraSink>) {
        self.sink = Some(sink);
        self.base_pose = *self.camera.pose();
        self.seen_revision = self.camera.revision();
        self.push(self.base_pose);
        info!("Camera sink bound");
    }

    /// Detach the render surface; the engine keeps its last pose
    pub fn unbind(&mut self) -> Option<Box<dyn CameraSink>> {
        let sink = self.sink.take();
        if sink.is_some() {
            info!("Camera sink unbound");
        }
        sink
    }

    pub fn is_bound(&self) -> bool {
        self.sink.is_some()
    }

    /// Pose currently shown by the render surface
    pub fn live_pose(&self) -> Result<CameraPose, CameraError> {
        self.sink
            .as_ref()
            .map(|sink| sink.get_pose())
            .ok_or(CameraError::MissingBinding)
    }

    /// Called once when an interaction starts and once when it ends
    pub fn set_user_interacting(&mut self, interacting: bool) {
        if self.interacting == interacting {
            return;
        }
        self.interacting = interacting;

        if interacting {
            self.camera.cancel_animation();
            self.resume = None;
            self.events.emit(CameraEvent::InteractionStarted);
            return;
        }

        // A running projection transition keeps the pose and records the
        // history entry itself when it lands.
        if !self.transitions.is_transitioning() {
            match self.live_pose() {
                Ok(pose) => self.camera.sync_pose(pose),
                Err(e) => debug!("Interaction ended: {}", e),
            }
            self.camera.commit();
            self.adopt_camera_pose();
        }
        self.arm_resume(self.config.motion_resume_delay_ms);
        self.events.emit(CameraEvent::InteractionEnded);
    }

    pub fn is_user_interacting(&self) -> bool {
        self.interacting
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.motion.set_blend_mode(mode);
    }

    /// Integrate one frame.
    ///
    /// Returns the pose written to the sink, or `None` when no sink is bound
    /// or the user owns the pose this frame.
    pub fn update_frame(&mut self, delta_seconds: f32, now_ms: f64) -> Option<CameraPose> {
        if self.sink.is_none() {
            debug!("update_frame called without a bound camera sink");
            return None;
        }
        self.now_ms = now_ms;
        self.animations.tick(delta_seconds);

        if let Some(frame) = self.transitions.poll() {
            self.camera.apply_frame(frame.pose, PoseSource::Transition);
            if frame.finished {
                self.camera.commit();
                self.arm_resume(0.0);
            }
            self.adopt_camera_pose();
            let pose = *self.camera.pose();
            self.push(pose);
            return Some(pose);
        }

        if self.interacting {
            if let Ok(pose) = self.live_pose() {
                self.camera.sync_pose(pose);
            }
            self.adopt_camera_pose();
            return None;
        }

        if self.camera.is_animating() {
            self.camera.update();
            self.adopt_camera_pose();
            self.arm_resume(0.0);
            let pose = *self.camera.pose();
            self.push(pose);
            return Some(pose);
        }

        if self.camera.revision() != self.seen_revision {
            self.adopt_camera_pose();
        }

        let weight = self.motion_weight(now_ms);
        let pose = if self.motion.is_producing() && weight > 0.0 {
            self.motion.advance(delta_seconds);
            let sample = self.motion.sample(&self.base_pose);
            let blended = blend_pose(
                self.motion.blend_mode(),
                &self.base_pose,
                &sample,
                self.config.additive_factor,
                self.interacting,
            );
            if weight >= 1.0 {
                blended
            } else {
                CameraPose::lerp(&self.base_pose, &blended, weight)
            }
        } else {
            *self.camera.pose()
        };

        if pose != *self.camera.pose() {
            self.camera.apply_frame(pose, PoseSource::Motion);
            self.seen_revision = self.camera.revision();
        }
        let pose = *self.camera.pose();
        self.push(pose);
        Some(pose)
    }

    /// Weight of procedural motion at `now_ms`: 0 while suspended, easing up
    /// to 1 over the resume transition
    pub fn motion_weight(&self, now_ms: f64) -> f32 {
        if self.interacting {
            return 0.0;
        }
        let Some(timer) = self.resume else {
            return 1.0;
        };
        let since = now_ms - timer.armed_at_ms - timer.delay_ms;
        if since < 0.0 {
            return 0.0;
        }
        let span = self.config.motion_resume_transition_ms;
        if span <= 0.0 {
            return 1.0;
        }
        Easing::SmoothStep.apply((since / span) as f32)
    }

    /// Scripted move of the camera position
    pub fn move_to(&mut self, position: Vec3, duration: f32) {
        self.scripted(PosePatch::position(position), duration);
    }

    pub fn look_at(&mut self, target: Vec3, duration: f32) {
        self.scripted(PosePatch::target(target), duration);
    }

    pub fn set_fov(&mut self, fov: f32, duration: f32) {
        self.scripted(PosePatch::fov(fov), duration);
    }

    /// Scripted move to a full pose
    pub fn transition_to(&mut self, pose: &CameraPose, duration: f32) {
        self.scripted(PosePatch::full(pose), duration);
    }

    /// Retarget the camera for a new projection mode
    pub fn transition_projection(&mut self, mode: ProjectionMode, options: TransitionOptions) -> bool {
        self.camera.cancel_animation();
        let from = *self.camera.pose();
        self.transitions.transition_from_pose(mode, &from, options)
    }

    pub fn cancel_transition(&mut self) -> bool {
        let cancelled = self.transitions.cancel_transition();
        if cancelled {
            self.adopt_camera_pose();
            self.arm_resume(0.0);
        }
        cancelled
    }

    pub fn camera(&self) -> &CameraService {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraService {
        &mut self.camera
    }

    pub fn motion(&self) -> &MotionService {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut MotionService {
        &mut self.motion
    }

    pub fn transitions(&self) -> &CameraTransitionService {
        &self.transitions
    }

    pub fn transitions_mut(&mut self) -> &mut CameraTransitionService {
        &mut self.transitions
    }

    pub fn base_pose(&self) -> &CameraPose {
        &self.base_pose
    }

    /// Return every component to its initial state; the sink stays bound
    pub fn reset(&mut self, initial: CameraPose) {
        self.transitions.reset();
        self.motion.reset();
        self.camera.reset(initial);
        self.interacting = false;
        self.resume = None;
        self.now_ms = 0.0;
        self.adopt_camera_pose();
        if self.sink.is_some() {
            self.push(self.base_pose);
        }
    }

    fn scripted(&mut self, patch: PosePatch, duration: f32) {
        if self.interacting {
            warn!("Ignoring scripted camera move during user interaction");
            return;
        }
        let options = SetPoseOptions::animated(duration).source(PoseSource::Script);
        self.camera.set_pose(patch, options);
    }

    fn adopt_camera_pose(&mut self) {
        self.base_pose = *self.camera.pose();
        self.seen_revision = self.camera.revision();
    }

    fn arm_resume(&mut self, delay_ms: f64) {
        self.resume = Some(ResumeTimer {
            armed_at_ms: self.now_ms,
            delay_ms,
        });
    }

    fn push(&mut self, pose: CameraPose) {
        let reference_fov = self.config.orthographic_reference_fov;
        if let Some(sink) = self.sink.as_mut() {
            sink.apply_pose(&pose);
            if sink.is_orthographic() {
                sink.set_zoom(fov_to_zoom(pose.fov, reference_fov));
            }
            sink.update();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::RecordingSink;
    use crate::motion::{MotionConfig, MotionType};

    const FRAME: f32 = 1.0 / 60.0;

    fn animator() -> (CameraAnimator, RecordingSink) {
        let config = EngineConfig::default();
        let mut animator = CameraAnimator::new(&config, AnimationService::new(), EventBus::new());
        let sink = RecordingSink::new(config.initial_pose);
        animator.bind(Box::new(sink.clone()));
        (animator, sink)
    }

    /// Run frames from `start_ms` for `seconds`; returns the end time
    fn run(animator: &mut CameraAnimator, start_ms: f64, seconds: f32) -> f64 {
        let frames = (seconds / FRAME).round() as usize;
        let mut now = start_ms;
        for _ in 0..frames {
            now += f64::from(FRAME) * 1000.0;
            animator.update_frame(FRAME, now);
        }
        now
    }

    #[test]
    fn test_unbound_frame_is_a_no_op() {
        let mut animator =
            CameraAnimator::new(&EngineConfig::default(), AnimationService::new(), EventBus::new());
        animator.motion_mut().start(MotionType::Orbit, None);
        let before = *animator.camera().pose();
        assert!(animator.update_frame(FRAME, 16.0).is_none());
        assert_eq!(*animator.camera().pose(), before);
    }

    #[test]
    fn test_orbit_override_reaches_sink() {
        let (mut animator, sink) = animator();
        animator
            .motion_mut()
            .start(MotionType::Orbit, Some(MotionConfig::default()));
        run(&mut animator, 0.0, 1.0);

        let pose = sink.pose();
        let radius = animator.motion().params().orbit_radius;
        assert!((pose.distance() - radius).abs() < 1e-3);
        assert_eq!(*animator.camera().pose(), pose);
        assert!(sink.updates() >= 60);
        // Motion frames never enter history
        assert_eq!(animator.camera().history().len(), 1);
    }

    #[test]
    fn test_user_interaction_owns_pose_then_motion_resumes() {
        let (mut animator, sink) = animator();
        animator.motion_mut().start(
            MotionType::Orbit,
            Some(MotionConfig::default().with_blend_mode(BlendMode::ManualPriority)),
        );
        let mut now = run(&mut animator, 0.0, 0.5);

        animator.set_user_interacting(true);
        let manual = CameraPose::new(Vec3::new(2.0, 1.0, 3.0), Vec3::ZERO, 35.0);
        sink.set_pose(manual);
        let elapsed = animator.motion().elapsed();
        let writes = sink.write_count();
        now = run(&mut animator, now, 0.5);

        assert_eq!(*animator.camera().pose(), manual);
        assert_eq!(sink.pose(), manual);
        assert_eq!(sink.write_count(), writes);
        assert_eq!(animator.motion().elapsed(), elapsed);

        animator.set_user_interacting(false);
        assert_eq!(animator.camera().history().len(), 2);

        // Still inside the resume delay
        now = run(&mut animator, now, 1.0);
        assert_eq!(sink.pose(), manual);
        assert_eq!(animator.motion().elapsed(), elapsed);

        // Blending back in
        now = run(&mut animator, now, 0.9);
        let weight = animator.motion_weight(now);
        assert!(weight > 0.0 && weight < 1.0);
        assert_ne!(sink.pose(), manual);

        now = run(&mut animator, now, 1.0);
        assert_eq!(animator.motion_weight(now), 1.0);
        assert!(animator.motion().elapsed() > elapsed);
    }

    #[test]
    fn test_projection_transition_suspends_motion() {
        let (mut animator, sink) = animator();
        animator.motion_mut().start(MotionType::Orbit, None);
        let now = run(&mut animator, 0.0, 0.25);
        let elapsed = animator.motion().elapsed();

        assert!(animator.transition_projection(ProjectionMode::Sphere, TransitionOptions::new()));
        let limits = ProjectionMode::Sphere.camera_preset().distance_limits;
        let mut time = now;
        while animator.transitions().is_transitioning() {
            time += f64::from(FRAME) * 1000.0;
            let pose = animator.update_frame(FRAME, time).unwrap();
            assert!(pose.distance() <= limits.max + 1e-4);
            assert_eq!(animator.motion().elapsed(), elapsed);
        }
        assert_eq!(
            animator.transitions().last_projection_mode(),
            Some(ProjectionMode::Sphere)
        );
        assert_eq!(sink.pose(), *animator.camera().pose());
        assert!(animator.motion_weight(time) < 1.0);
    }

    #[test]
    fn test_interaction_during_transition_keeps_history_clean() {
        let (mut animator, _sink) = animator();
        let start = *animator.camera().pose();
        assert!(animator.transition_projection(ProjectionMode::Sphere, TransitionOptions::new()));
        let mut now = run(&mut animator, 0.0, 20.0 * FRAME);
        assert!(animator.transitions().is_transitioning());

        animator.set_user_interacting(true);
        animator.set_user_interacting(false);
        assert_eq!(animator.camera().history().len(), 1);

        while animator.transitions().is_transitioning() {
            now += f64::from(FRAME) * 1000.0;
            animator.update_frame(FRAME, now);
        }
        assert_eq!(animator.camera().history().len(), 2);

        assert!(animator.camera_mut().undo());
        assert!(animator.camera().pose().abs_diff_eq(&start, 1e-5));
        assert!(!animator.camera().can_undo());
    }

    #[test]
    fn test_cancel_transition_holds_pose_then_resumes_motion() {
        let (mut animator, sink) = animator();
        animator.motion_mut().start(MotionType::Orbit, None);
        let now = run(&mut animator, 0.0, 0.25);
        let elapsed = animator.motion().elapsed();

        assert!(animator.transition_projection(ProjectionMode::Sphere, TransitionOptions::new()));
        let mut now = run(&mut animator, now, 20.0 * FRAME);
        let last = sink.pose();

        assert!(animator.cancel_transition());
        assert!(!animator.cancel_transition());
        assert_eq!(*animator.camera().pose(), last);
        assert_eq!(sink.pose(), last);
        assert_eq!(*animator.base_pose(), last);
        assert!(last.is_finite());
        assert_eq!(animator.motion_weight(now), 0.0);

        // No snap back: the first frames only ease away from the held pose
        now += f64::from(FRAME) * 1000.0;
        let first = animator.update_frame(FRAME, now).unwrap();
        assert!(first.position.distance(last.position) < 0.1);
        assert!(first.is_finite());

        let mut previous = animator.motion_weight(now);
        assert!(previous > 0.0 && previous < 0.01);
        for _ in 0..60 {
            now += f64::from(FRAME) * 1000.0;
            animator.update_frame(FRAME, now);
            let weight = animator.motion_weight(now);
            assert!(weight >= previous);
            previous = weight;
        }
        assert_eq!(animator.motion_weight(now), 1.0);
        assert!(animator.motion().elapsed() > elapsed);
        assert_eq!(sink.pose(), *animator.camera().pose());
    }

    #[test]
    fn test_scripted_move_takes_priority() {
        let (mut animator, sink) = animator();
        animator.motion_mut().start(MotionType::Orbit, None);
        let now = run(&mut animator, 0.0, 0.25);
        let elapsed = animator.motion().elapsed();

        let destination = Vec3::new(0.0, 5.0, 5.0);
        animator.move_to(destination, 0.5);
        let mut now = now;
        while animator.camera().is_animating() {
            now += f64::from(FRAME) * 1000.0;
            animator.update_frame(FRAME, now);
        }
        assert!(sink.pose().position.abs_diff_eq(destination, 1e-4));
        assert_eq!(animator.motion().elapsed(), elapsed);
        assert_eq!(animator.base_pose().position, sink.pose().position);

        // Motion resumes around the new base after the blend-in
        run(&mut animator, now, 1.0);
        assert!(animator.motion().elapsed() > elapsed);
    }

    #[test]
    fn test_additive_motion_offsets_base() {
        let (mut animator, sink) = animator();
        let base = CameraPose::new(Vec3::new(0.0, 2.0, 8.0), Vec3::ZERO, 50.0);
        animator
            .camera_mut()
            .set_pose(PosePatch::full(&base), SetPoseOptions::default());
        animator.motion_mut().start(
            MotionType::DollyZoom,
            Some(MotionConfig::default().with_blend_mode(BlendMode::Additive)),
        );
        run(&mut animator, 0.0, 2.0);

        assert_eq!(*animator.base_pose(), base);
        let motion = animator.motion().sample(&base);
        let expected = blend_pose(BlendMode::Additive, &base, &motion, 0.35, false);
        assert!(sink.pose().abs_diff_eq(&expected, 1e-5));
    }

    #[test]
    fn test_orthographic_sink_gets_zoom() {
        let config = EngineConfig::default();
        let mut animator = CameraAnimator::new(&config, AnimationService::new(), EventBus::new());
        let sink = RecordingSink::orthographic(config.initial_pose);
        animator.bind(Box::new(sink.clone()));

        animator.set_fov(25.0, 0.0);
        animator.update_frame(FRAME, 16.0);
        let expected = fov_to_zoom(25.0, config.animator.orthographic_reference_fov);
        assert!((sink.zoom() - expected).abs() < 1e-5);
        assert!(sink.zoom() > 1.0);
    }

    #[test]
    fn test_unbind_keeps_pose() {
        let (mut animator, sink) = animator();
        animator.move_to(Vec3::new(1.0, 1.0, 1.0), 0.0);
        assert_eq!(animator.live_pose(), Ok(sink.pose()));
        assert!(animator.unbind().is_some());
        assert_eq!(animator.live_pose(), Err(CameraError::MissingBinding));
        let pose = *animator.camera().pose();
        assert!(animator.update_frame(FRAME, 100.0).is_none());
        assert_eq!(*animator.camera().pose(), pose);
    }
}
