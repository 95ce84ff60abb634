use std::fmt;

use tracing::{debug, info, warn};
use vantage_anim::{AnimationService, CompleteFn, Tween, TweenOptions};
use vantage_core::{CameraPose, Easing, PosePatch, Vec3};

use super::{BookmarkId, CameraBookmark, CameraViewPreset, History};
use crate::config::CameraServiceConfig;
use crate::error::CameraError;
use crate::events::{CameraEvent, EventBus, PoseSource};
use crate::persistence::{self, KeyValueStore, BOOKMARKS_KEY};

const MIN_FOV: f32 = 1.0;
const MAX_FOV: f32 = 179.0;

/// Options for [`CameraService::set_pose`]
pub struct SetPoseOptions {
    /// Animation duration in seconds; zero applies the pose immediately
    pub duration: f32,
    pub easing: Option<Easing>,
    pub source: PoseSource,
    /// Overrides whether the write pushes a history entry
    pub record_history: Option<bool>,
    on_update: Option<Box<dyn FnMut(f32)>>,
    on_complete: Option<CompleteFn>,
}

impl Default for SetPoseOptions {
    fn default() -> Self {
        Self {
            duration: 0.0,
            easing: None,
            source: PoseSource::User,
            record_history: None,
            on_update: None,
            on_complete: None,
        }
    }
}

impl fmt::Debug for SetPoseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetPoseOptions")
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("source", &self.source)
            .field("record_history", &self.record_history)
            .finish_non_exhaustive()
    }
}

impl SetPoseOptions {
    /// Apply at once, tagged with `source`
    pub fn immediate(source: PoseSource) -> Self {
        Self {
            source,
            ..Default::default()
        }
    }

    /// Animate over `duration` seconds
    pub fn animated(duration: f32) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    pub fn source(mut self, source: PoseSource) -> Self {
        self.source = source;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn without_history(mut self) -> Self {
        self.record_history = Some(false);
        self
    }

    /// Called with linear progress on every animated step (once with 1.0 when immediate)
    pub fn on_update(mut self, f: impl FnMut(f32) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    fn records_history(&self) -> bool {
        self.record_history
            .unwrap_or_else(|| self.source.records_history())
    }
}

struct PoseAnimation {
    tween: Tween<CameraPose>,
    source: PoseSource,
    /// Runs from `update` once the final pose has been written
    on_complete: Option<CompleteFn>,
}

/// Single writer of the camera pose.
///
/// Every other component proposes changes through this API. Animated
/// changes are driven by the shared [`AnimationService`] and applied on
/// [`update`](CameraService::update).
pub struct CameraService {
    config: CameraServiceConfig,
    pose: CameraPose,
    history: History,
    bookmarks: Vec<CameraBookmark>,
    animations: AnimationService,
    events: EventBus,
    active: Option<PoseAnimation>,
    revision: u64,
}

impl CameraService {
    pub fn new(
        initial: CameraPose,
        config: CameraServiceConfig,
        animations: AnimationService,
        events: EventBus,
    ) -> Self {
        let initial = sanitize(initial).unwrap_or_default();
        Self {
            history: History::new(initial, config.history_limit),
            config,
            pose: initial,
            bookmarks: Vec::new(),
            animations,
            events,
            active: None,
            revision: 0,
        }
    }

    pub fn config(&self) -> &CameraServiceConfig {
        &self.config
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    /// Counter bumped on every pose write
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Merge `patch` into the current pose, immediately or animated.
    ///
    /// A new request cancels any in-flight animated change, leaving the
    /// pose where that animation last put it.
    pub fn set_pose(&mut self, patch: PosePatch, options: SetPoseOptions) {
        let Some(target) = sanitize(self.pose.merged(&patch)) else {
            warn!("Ignoring non-finite camera pose request");
            return;
        };

        self.cancel_animation();

        if options.records_history() {
            self.push_history(target);
        }

        let SetPoseOptions {
            duration,
            easing,
            source,
            on_update,
            on_complete,
            ..
        } = options;

        if duration > 0.0 {
            let easing = easing.unwrap_or(self.config.default_easing);
            let mut tween_options: TweenOptions<CameraPose> =
                TweenOptions::new(duration).easing(easing);
            if let Some(mut on_update) = on_update {
                tween_options = tween_options.on_update(move |_, progress| on_update(progress));
            }
            debug!(duration, source = source.name(), "animating camera pose");
            let tween = self.animations.animate(self.pose, target, tween_options);
            self.active = Some(PoseAnimation {
                tween,
                source,
                on_complete,
            });
        } else {
            self.write(target, source);
            if let Some(mut on_update) = on_update {
                on_update(1.0);
            }
            if let Some(on_complete) = on_complete {
                on_complete();
            }
        }
    }

    pub fn move_to(&mut self, position: Vec3, options: SetPoseOptions) {
        self.set_pose(PosePatch::position(position), options);
    }

    pub fn look_at(&mut self, target: Vec3, options: SetPoseOptions) {
        self.set_pose(PosePatch::target(target), options);
    }

    pub fn set_fov(&mut self, fov: f32, options: SetPoseOptions) {
        self.set_pose(PosePatch::fov(fov), options);
    }

    /// Jump to a canonical view using the configured preset duration
    pub fn apply_preset(&mut self, preset: CameraViewPreset) {
        let options = SetPoseOptions::animated(self.config.preset_duration);
        self.apply_preset_with(preset, options);
    }

    pub fn apply_preset_with(&mut self, preset: CameraViewPreset, options: SetPoseOptions) {
        // Resolve against the pose being moved to, so a preset applied
        // mid-flight keeps the distance of the previous destination.
        let reference = self.destination();
        let pose = preset.resolve(&reference, self.config.focus_distance);
        info!("Applying camera preset {}", preset.name());
        self.set_pose(PosePatch::full(&pose), options.source(PoseSource::Preset));
        self.events.emit(CameraEvent::ViewPresetApplied { preset });
    }

    /// Resolve a preset by name; unknown names are logged and ignored
    pub fn apply_preset_by_name(&mut self, name: &str) -> bool {
        match CameraViewPreset::from_name(name) {
            Some(preset) => {
                self.apply_preset(preset);
                true
            }
            None => {
                warn!("Unknown camera preset '{}'", name);
                false
            }
        }
    }

    /// Pose the camera is heading to: the animation target, or the current pose
    pub fn destination(&self) -> CameraPose {
        self.active
            .as_ref()
            .map(|active| active.tween.to())
            .unwrap_or(self.pose)
    }

    /// Apply the in-flight animated change, if any.
    ///
    /// Returns whether an animation is still running afterwards. The
    /// request's `on_complete` runs here, after the final pose is written.
    pub fn update(&mut self) -> bool {
        let Some(active) = self.active.as_ref() else {
            return false;
        };
        let pose = active.tween.value();
        let source = active.source;
        let running = self.animations.is_active(active.tween.handle());

        self.write(pose, source);
        if !running {
            if let Some(on_complete) = self.active.take().and_then(|a| a.on_complete) {
                on_complete();
            }
        }
        running
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Stop an animated change where it is
    pub fn cancel_animation(&mut self) {
        if let Some(active) = self.active.take() {
            self.animations.cancel(active.tween.handle(), false);
            let pose = active.tween.value();
            if pose != self.pose {
                self.write(pose, active.source);
            }
        }
    }

    /// Write a pose coming back from the render surface without recording history
    pub fn sync_pose(&mut self, pose: CameraPose) {
        if let Some(pose) = sanitize(pose) {
            self.write(pose, PoseSource::Sync);
        }
    }

    /// Write a per-frame pose (motion or transition output) without recording history
    pub fn apply_frame(&mut self, pose: CameraPose, source: PoseSource) {
        match sanitize(pose) {
            Some(pose) => self.write(pose, source),
            None => debug!(source = source.name(), "dropping non-finite frame pose"),
        }
    }

    /// Record the current pose as a history entry if it differs from the
    /// entry the history currently points at
    pub fn commit(&mut self) {
        if *self.history.current() != self.pose {
            self.push_history(self.pose);
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back in history; applied instantly
    pub fn undo(&mut self) -> bool {
        self.cancel_animation();
        match self.history.undo() {
            Some(pose) => {
                self.write(pose, PoseSource::History);
                self.emit_history();
                true
            }
            None => false,
        }
    }

    /// Step forward in history; applied instantly
    pub fn redo(&mut self) -> bool {
        self.cancel_animation();
        match self.history.redo() {
            Some(pose) => {
                self.write(pose, PoseSource::History);
                self.emit_history();
                true
            }
            None => false,
        }
    }

    pub fn bookmarks(&self) -> &[CameraBookmark] {
        &self.bookmarks
    }

    pub fn bookmark(&self, id: BookmarkId) -> Option<&CameraBookmark> {
        self.bookmarks.iter().find(|b| b.id == id)
    }

    /// Snapshot the current pose under `name`
    pub fn save_bookmark(&mut self, name: impl Into<String>) -> BookmarkId {
        let bookmark = CameraBookmark::new(name, self.pose);
        let id = bookmark.id;
        info!("Saved camera bookmark '{}'", bookmark.name);
        self.events.emit(CameraEvent::BookmarkSaved {
            id,
            name: bookmark.name.clone(),
        });
        self.bookmarks.push(bookmark);
        id
    }

    /// Animate to a bookmark's stored pose
    pub fn load_bookmark(&mut self, id: BookmarkId) -> Result<(), CameraError> {
        let pose = self
            .bookmark(id)
            .map(|bookmark| bookmark.pose)
            .ok_or(CameraError::UnknownBookmark(id))?;
        let options =
            SetPoseOptions::animated(self.config.default_duration).source(PoseSource::Bookmark);
        self.set_pose(PosePatch::full(&pose), options);
        self.events.emit(CameraEvent::BookmarkLoaded { id });
        Ok(())
    }

    pub fn delete_bookmark(&mut self, id: BookmarkId) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|b| b.id != id);
        let removed = self.bookmarks.len() < before;
        if removed {
            self.events.emit(CameraEvent::BookmarkDeleted { id });
        }
        removed
    }

    /// Replace the bookmark list with the persisted one.
    ///
    /// Storage failures keep the in-memory list unchanged.
    pub fn load_bookmarks(&mut self, store: &dyn KeyValueStore) -> usize {
        match store.read(BOOKMARKS_KEY) {
            Ok(Some(json)) => match persistence::decode_envelope::<CameraBookmark>(&json) {
                Ok(bookmarks) => {
                    info!("Loaded {} camera bookmarks", bookmarks.len());
                    self.bookmarks = bookmarks;
                }
                Err(e) => warn!("Failed to parse camera bookmarks: {}, keeping current list", e),
            },
            Ok(None) => debug!("No stored camera bookmarks"),
            Err(e) => warn!("Failed to read camera bookmarks: {}, keeping current list", e),
        }
        self.bookmarks.len()
    }

    pub fn save_bookmarks(&self, store: &mut dyn KeyValueStore) -> bool {
        persistence::save_collection(store, BOOKMARKS_KEY, &self.bookmarks)
    }

    /// Return to `initial` with empty history and no bookmarks
    pub fn reset(&mut self, initial: CameraPose) {
        if let Some(active) = self.active.take() {
            self.animations.cancel(active.tween.handle(), false);
        }
        let initial = sanitize(initial).unwrap_or_default();
        self.history.reset(initial);
        self.bookmarks.clear();
        self.write(initial, PoseSource::Script);
    }

    fn write(&mut self, pose: CameraPose, source: PoseSource) {
        self.pose = pose;
        self.revision += 1;
        self.events.emit(CameraEvent::PoseChanged { pose, source });
    }

    fn push_history(&mut self, pose: CameraPose) {
        self.history.push(pose);
        self.emit_history();
    }

    fn emit_history(&self) {
        self.events.emit(CameraEvent::HistoryChanged {
            index: self.history.current_index(),
            len: self.history.len(),
        });
    }
}

fn sanitize(mut pose: CameraPose) -> Option<CameraPose> {
    if !pose.is_finite() {
        return None;
    }
    pose.fov = pose.fov.clamp(MIN_FOV, MAX_FOV);
    if pose.up.length_squared() <= f32::EPSILON {
        pose.up = Vec3::Y;
    }
    Some(pose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn service() -> (CameraService, AnimationService, EventBus) {
        let animations = AnimationService::new();
        let events = EventBus::new();
        let camera = CameraService::new(
            CameraPose::default(),
            CameraServiceConfig::default(),
            animations.clone(),
            events.clone(),
        );
        (camera, animations, events)
    }

    fn run(camera: &mut CameraService, animations: &AnimationService, seconds: f32) {
        let steps = (seconds / 0.05).ceil() as usize + 1;
        for _ in 0..steps {
            animations.tick(0.05);
            camera.update();
        }
    }

    #[test]
    fn test_undo_returns_to_start() {
        let (mut camera, _, _) = service();
        let start = *camera.pose();
        for i in 1..=5 {
            camera.move_to(Vec3::new(i as f32, 0.0, 10.0), SetPoseOptions::default());
        }
        for _ in 0..5 {
            assert!(camera.undo());
        }
        assert_eq!(*camera.pose(), start);
        assert!(!camera.can_undo());
        assert!(camera.can_redo());
    }

    #[test]
    fn test_new_pose_after_undo_discards_redo() {
        let (mut camera, _, _) = service();
        camera.move_to(Vec3::X, SetPoseOptions::default());
        camera.move_to(Vec3::Y, SetPoseOptions::default());
        camera.undo();
        assert!(camera.can_redo());

        camera.set_fov(70.0, SetPoseOptions::default());
        assert!(!camera.can_redo());
        assert!(!camera.redo());
    }

    #[test]
    fn test_sync_does_not_record_history() {
        let (mut camera, _, _) = service();
        camera.sync_pose(CameraPose::new(Vec3::ONE, Vec3::ZERO, 40.0));
        assert_eq!(camera.history().len(), 1);
        assert_eq!(camera.pose().position, Vec3::ONE);
    }

    #[test]
    fn test_animated_pose_change() {
        let (mut camera, animations, _) = service();
        let progress = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&progress);
        camera.move_to(
            Vec3::new(0.0, 0.0, 20.0),
            SetPoseOptions::animated(0.5).on_update(move |p| log.borrow_mut().push(p)),
        );
        assert!(camera.is_animating());
        assert_eq!(camera.pose().position.z, 10.0);

        animations.tick(0.25);
        camera.update();
        let z = camera.pose().position.z;
        assert!(z > 10.0 && z < 20.0);

        run(&mut camera, &animations, 0.5);
        assert!(!camera.is_animating());
        assert_eq!(camera.pose().position.z, 20.0);
        assert_eq!(progress.borrow().last().copied(), Some(1.0));
    }

    #[test]
    fn test_pose_events_carry_source() {
        let (mut camera, _, events) = service();
        let sources = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&sources);
        let _sub = events.subscribe_to("camera:pose", move |event| {
            if let CameraEvent::PoseChanged { source, .. } = event {
                log.borrow_mut().push(*source);
            }
        });

        camera.move_to(Vec3::X, SetPoseOptions::default());
        camera.sync_pose(*camera.pose());
        camera.undo();
        assert_eq!(
            *sources.borrow(),
            vec![PoseSource::User, PoseSource::Sync, PoseSource::History]
        );
    }

    #[test]
    fn test_preset_round_trip_restores_distance() {
        let (mut camera, animations, _) = service();
        camera.set_pose(
            PosePatch::position(Vec3::new(2.0, 3.0, 6.0)),
            SetPoseOptions::default(),
        );
        let distance = camera.pose().distance();

        for preset in [
            CameraViewPreset::Front,
            CameraViewPreset::Top,
            CameraViewPreset::Front,
        ] {
            camera.apply_preset(preset);
            run(&mut camera, &animations, 1.0);
        }
        assert!((camera.pose().distance() - distance).abs() < 1e-4);
        assert!(camera
            .pose()
            .position
            .abs_diff_eq(Vec3::new(0.0, 0.0, distance), 1e-4));
    }

    #[test]
    fn test_preset_mid_flight_uses_destination_distance() {
        let (mut camera, animations, _) = service();
        camera.apply_preset(CameraViewPreset::Top);
        animations.tick(0.3);
        camera.update();
        camera.apply_preset(CameraViewPreset::Side);
        run(&mut camera, &animations, 1.0);
        assert!((camera.pose().distance() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_bookmarks() {
        let (mut camera, animations, _) = service();
        let saved_pose = *camera.pose();
        let id = camera.save_bookmark("home");
        camera.move_to(Vec3::new(5.0, 5.0, 5.0), SetPoseOptions::default());

        camera.load_bookmark(id).unwrap();
        run(&mut camera, &animations, 1.0);
        assert!(camera.pose().abs_diff_eq(&saved_pose, 1e-5));

        assert!(camera.delete_bookmark(id));
        assert!(!camera.delete_bookmark(id));
        assert_eq!(camera.load_bookmark(id), Err(CameraError::UnknownBookmark(id)));
    }

    #[test]
    fn test_bookmark_persistence() {
        let (mut camera, _, _) = service();
        camera.save_bookmark("a");
        camera.save_bookmark("b");
        let mut store = MemoryStore::new();
        assert!(camera.save_bookmarks(&mut store));

        let (mut restored, _, _) = service();
        assert_eq!(restored.load_bookmarks(&store), 2);
        assert_eq!(restored.bookmarks()[1].name, "b");

        // A failing store leaves the list alone
        assert_eq!(restored.load_bookmarks(&MemoryStore::unavailable()), 2);
    }

    #[test]
    fn test_invalid_requests_are_ignored() {
        let (mut camera, _, _) = service();
        let before = *camera.pose();
        camera.move_to(Vec3::new(f32::NAN, 0.0, 0.0), SetPoseOptions::default());
        assert_eq!(*camera.pose(), before);

        camera.set_fov(500.0, SetPoseOptions::default());
        assert_eq!(camera.pose().fov, MAX_FOV);
    }

    #[test]
    fn test_cancel_leaves_last_value() {
        let (mut camera, animations, _) = service();
        camera.move_to(Vec3::new(0.0, 0.0, 30.0), SetPoseOptions::animated(1.0));
        animations.tick(0.5);
        camera.update();
        let mid = *camera.pose();

        camera.cancel_animation();
        animations.tick(1.0);
        camera.update();
        assert_eq!(*camera.pose(), mid);
    }

    #[test]
    fn test_on_complete_sees_settled_pose() {
        let (mut camera, animations, events) = service();
        let latest = Rc::new(RefCell::new(CameraPose::default()));
        let tracked = Rc::clone(&latest);
        let _sub = events.subscribe_to("camera:pose", move |event| {
            if let CameraEvent::PoseChanged { pose, .. } = event {
                *tracked.borrow_mut() = *pose;
            }
        });
        let seen = Rc::new(RefCell::new(None));
        let log = Rc::clone(&seen);
        let reader = Rc::clone(&latest);
        camera.move_to(
            Vec3::new(0.0, 0.0, 20.0),
            SetPoseOptions::animated(0.25).on_complete(move || {
                *log.borrow_mut() = Some(reader.borrow().position.z);
            }),
        );

        animations.tick(0.25);
        assert!(seen.borrow().is_none());
        assert!(!camera.update());
        assert_eq!(*seen.borrow(), Some(20.0));
    }

    #[test]
    fn test_cancelled_move_skips_on_complete() {
        let (mut camera, animations, _) = service();
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        camera.move_to(
            Vec3::new(0.0, 0.0, 20.0),
            SetPoseOptions::animated(1.0).on_complete(move || *flag.borrow_mut() = true),
        );
        animations.tick(0.5);
        camera.update();
        camera.cancel_animation();
        run(&mut camera, &animations, 1.0);
        assert!(!*fired.borrow());
    }
}
