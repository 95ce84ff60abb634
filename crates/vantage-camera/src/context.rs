//! Engine context wiring the camera services together

use tracing::info;
use vantage_anim::AnimationService;
use vantage_core::{CameraPose, FrameClock};

use crate::animator::{CameraAnimator, CameraSink};
use crate::camera::CameraService;
use crate::config::EngineConfig;
use crate::error::CameraError;
use crate::events::EventBus;
use crate::motion::{MotionPresetLibrary, MotionService};
use crate::persistence::KeyValueStore;

/// Owns every camera service for one viewport.
///
/// Construct once at startup, call [`tick`](Self::tick) once per rendered
/// frame and [`reset`](Self::reset) to return to the initial state.
pub struct CameraContext {
    config: EngineConfig,
    clock: FrameClock,
    animations: AnimationService,
    events: EventBus,
    animator: CameraAnimator,
    presets: MotionPresetLibrary,
}

impl CameraContext {
    pub fn new(config: EngineConfig) -> Self {
        let animations = AnimationService::new();
        let events = EventBus::new();
        let animator = CameraAnimator::new(&config, animations.clone(), events.clone());
        let presets = MotionPresetLibrary::new(events.clone());
        info!("Camera context created");
        Self {
            clock: FrameClock::new(config.clock.clone()),
            config,
            animations,
            events,
            animator,
            presets,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Advance the clock and integrate one frame
    pub fn tick(&mut self, delta_seconds: f32) -> Option<CameraPose> {
        self.clock.update(delta_seconds);
        self.animator
            .update_frame(self.clock.delta, self.clock.now_ms())
    }

    pub fn bind(&mut self, sink: Box<dyn CameraSink>) {
        self.animator.bind(sink);
    }

    pub fn unbind(&mut self) -> Option<Box<dyn CameraSink>> {
        self.animator.unbind()
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn animations(&self) -> &AnimationService {
        &self.animations
    }

    pub fn animator(&self) -> &CameraAnimator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut CameraAnimator {
        &mut self.animator
    }

    pub fn camera(&self) -> &CameraService {
        self.animator.camera()
    }

    pub fn camera_mut(&mut self) -> &mut CameraService {
        self.animator.camera_mut()
    }

    pub fn motion(&self) -> &MotionService {
        self.animator.motion()
    }

    pub fn motion_mut(&mut self) -> &mut MotionService {
        self.animator.motion_mut()
    }

    pub fn presets(&self) -> &MotionPresetLibrary {
        &self.presets
    }

    /// Save the current motion as a named preset
    pub fn save_motion_preset(&mut self, name: &str) {
        self.presets.save(name, self.animator.motion());
    }

    pub fn apply_motion_preset(&mut self, name: &str) -> Result<(), CameraError> {
        self.presets.apply(name, self.animator.motion_mut())
    }

    pub fn delete_motion_preset(&mut self, name: &str) -> bool {
        self.presets.delete(name)
    }

    /// Load bookmarks and motion presets from `store`
    pub fn load(&mut self, store: &dyn KeyValueStore) {
        self.animator.camera_mut().load_bookmarks(store);
        self.presets.load(store);
    }

    /// Persist bookmarks and motion presets; returns whether both were written
    pub fn save(&self, store: &mut dyn KeyValueStore) -> bool {
        let bookmarks = self.animator.camera().save_bookmarks(store);
        let presets = self.presets.persist(store);
        bookmarks && presets
    }

    /// Drop all animations, motion, transitions, history and bookmarks.
    ///
    /// Listeners and stored presets stay registered.
    pub fn reset(&mut self) {
        self.animations.reset();
        self.clock.reset();
        self.animator.reset(self.config.initial_pose);
        info!("Camera context reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::RecordingSink;
    use crate::camera::SetPoseOptions;
    use crate::motion::MotionType;
    use crate::persistence::MemoryStore;
    use vantage_core::{PosePatch, Vec3};

    #[test]
    fn test_tick_drives_motion() {
        let mut context = CameraContext::new(EngineConfig::default());
        let sink = RecordingSink::new(CameraPose::default());
        context.bind(Box::new(sink.clone()));
        context.motion_mut().start(MotionType::Orbit, None);

        for _ in 0..30 {
            assert!(context.tick(1.0 / 30.0).is_some());
        }
        assert_eq!(context.clock().frame_count, 30);
        assert!((context.clock().now_ms() - 1000.0).abs() < 1e-2);
        assert!((context.motion().elapsed() - 1.0).abs() < 1e-4);
        assert_eq!(sink.pose(), *context.camera().pose());
    }

    #[test]
    fn test_large_delta_is_clamped() {
        let mut context = CameraContext::new(EngineConfig::default());
        context.bind(Box::new(RecordingSink::new(CameraPose::default())));
        context.motion_mut().start(MotionType::Orbit, None);
        context.tick(5.0);
        assert!((context.motion().elapsed() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut context = CameraContext::new(EngineConfig::default());
        context.bind(Box::new(RecordingSink::new(CameraPose::default())));
        context
            .camera_mut()
            .set_pose(PosePatch::position(Vec3::ONE), SetPoseOptions::animated(1.0));
        context.motion_mut().start(MotionType::Spiral, None);
        context.camera_mut().save_bookmark("spot");
        context.tick(0.1);

        context.reset();
        assert_eq!(*context.camera().pose(), context.config().initial_pose);
        assert!(!context.motion().is_active());
        assert!(context.camera().bookmarks().is_empty());
        assert!(!context.animations().is_animating());
        assert_eq!(context.clock().frame_count, 0);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let mut context = CameraContext::new(EngineConfig::default());
        context.camera_mut().save_bookmark("overview");
        context.motion_mut().start(MotionType::Arc, None);
        context.save_motion_preset("sweep");

        let mut store = MemoryStore::new();
        assert!(context.save(&mut store));

        let mut restored = CameraContext::new(EngineConfig::default());
        restored.load(&store);
        assert_eq!(restored.camera().bookmarks().len(), 1);
        restored.apply_motion_preset("sweep").unwrap();
        assert_eq!(restored.motion().motion_type(), MotionType::Arc);
    }
}
