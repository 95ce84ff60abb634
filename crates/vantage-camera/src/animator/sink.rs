//! Render-surface adapter

use std::cell::RefCell;
use std::rc::Rc;

use vantage_core::CameraPose;

/// The camera object and controls of whatever renders the scene.
///
/// The animator reads the live pose while the user drives the controls and
/// writes the integrated pose back once per frame.
pub trait CameraSink {
    /// Current pose of the render camera
    fn get_pose(&self) -> CameraPose;

    /// Write position, target, up and fov onto the render camera
    fn apply_pose(&mut self, pose: &CameraPose);

    fn is_orthographic(&self) -> bool {
        false
    }

    /// Orthographic zoom, only called when [`is_orthographic`](Self::is_orthographic)
    fn set_zoom(&mut self, _zoom: f32) {}

    /// Called after every write, e.g. to refresh controls and matrices
    fn update(&mut self) {}
}

#[derive(Debug, Default)]
struct RecordingState {
    pose: CameraPose,
    writes: Vec<CameraPose>,
    updates: usize,
    zoom: f32,
    orthographic: bool,
}

/// In-memory sink that records every write.
///
/// Clones share the same state, so a test or headless host can keep one
/// handle while the animator owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Rc<RefCell<RecordingState>>,
}

impl RecordingSink {
    pub fn new(pose: CameraPose) -> Self {
        Self {
            state: Rc::new(RefCell::new(RecordingState {
                pose,
                zoom: 1.0,
                ..Default::default()
            })),
        }
    }

    pub fn orthographic(pose: CameraPose) -> Self {
        let sink = Self::new(pose);
        sink.state.borrow_mut().orthographic = true;
        sink
    }

    pub fn pose(&self) -> CameraPose {
        self.state.borrow().pose
    }

    /// Move the camera as user controls would, without recording a write
    pub fn set_pose(&self, pose: CameraPose) {
        self.state.borrow_mut().pose = pose;
    }

    pub fn writes(&self) -> Vec<CameraPose> {
        self.state.borrow().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.borrow().writes.len()
    }

    pub fn last_write(&self) -> Option<CameraPose> {
        self.state.borrow().writes.last().copied()
    }

    pub fn updates(&self) -> usize {
        self.state.borrow().updates
    }

    pub fn zoom(&self) -> f32 {
        self.state.borrow().zoom
    }

    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.writes.clear();
        state.updates = 0;
    }
}

impl CameraSink for RecordingSink {
    fn get_pose(&self) -> CameraPose {
        self.pose()
    }

    fn apply_pose(&mut self, pose: &CameraPose) {
        let mut state = self.state.borrow_mut();
        state.pose = *pose;
        state.writes.push(*pose);
    }

    fn is_orthographic(&self) -> bool {
        self.state.borrow().orthographic
    }

    fn set_zoom(&mut self, zoom: f32) {
        self.state.borrow_mut().zoom = zoom;
    }

    fn update(&mut self) {
        self.state.borrow_mut().updates += 1;
    }
}
