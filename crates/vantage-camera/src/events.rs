//! In-process event bus for camera lifecycle notifications
//!
//! Dispatch is synchronous and multicast. Events emitted from inside a
//! listener are queued and delivered after the current dispatch finishes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use vantage_core::CameraPose;

use crate::camera::{BookmarkId, CameraViewPreset};
use crate::motion::{BlendMode, MotionType};
use crate::transition::ProjectionMode;

/// Origin of a pose write, used by observers to ignore their own echoes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoseSource {
    /// Direct user manipulation
    User,
    /// Write-back from the render surface; never recorded in history
    Sync,
    /// Programmatic request
    Script,
    /// Procedural motion output
    Motion,
    /// Projection-mode transition frame
    Transition,
    /// View preset jump
    Preset,
    /// Bookmark recall
    Bookmark,
    /// Undo or redo
    History,
}

impl PoseSource {
    pub fn name(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Sync => "sync",
            Self::Script => "script",
            Self::Motion => "motion",
            Self::Transition => "transition",
            Self::Preset => "preset",
            Self::Bookmark => "bookmark",
            Self::History => "history",
        }
    }

    /// Whether a write from this source pushes a history entry by default
    pub fn records_history(&self) -> bool {
        matches!(
            self,
            Self::User | Self::Script | Self::Preset | Self::Bookmark
        )
    }
}

/// Notifications emitted by the camera services
#[derive(Debug, Clone, PartialEq)]
pub enum CameraEvent {
    PoseChanged { pose: CameraPose, source: PoseSource },
    HistoryChanged { index: usize, len: usize },
    BookmarkSaved { id: BookmarkId, name: String },
    BookmarkLoaded { id: BookmarkId },
    BookmarkDeleted { id: BookmarkId },
    ViewPresetApplied { preset: CameraViewPreset },
    MotionStarted { motion_type: MotionType },
    MotionStopped,
    MotionPaused { progress: f32 },
    MotionResumed { progress: f32 },
    MotionProgress { progress: f32 },
    BlendModeChanged { mode: BlendMode },
    MotionPresetSaved { name: String },
    MotionPresetDeleted { name: String },
    MotionPresetApplied { name: String },
    TransitionStarted { from: Option<ProjectionMode>, to: ProjectionMode },
    TransitionCompleted { mode: ProjectionMode },
    TransitionCancelled { mode: ProjectionMode },
    InteractionStarted,
    InteractionEnded,
}

impl CameraEvent {
    /// Namespaced event name, e.g. `camera:pose-changed`
    pub fn name(&self) -> &'static str {
        match self {
            Self::PoseChanged { .. } => "camera:pose-changed",
            Self::HistoryChanged { .. } => "camera:history-changed",
            Self::BookmarkSaved { .. } => "camera:bookmark-saved",
            Self::BookmarkLoaded { .. } => "camera:bookmark-loaded",
            Self::BookmarkDeleted { .. } => "camera:bookmark-deleted",
            Self::ViewPresetApplied { .. } => "camera:view-preset-applied",
            Self::MotionStarted { .. } => "motion:started",
            Self::MotionStopped => "motion:stopped",
            Self::MotionPaused { .. } => "motion:paused",
            Self::MotionResumed { .. } => "motion:resumed",
            Self::MotionProgress { .. } => "motion:progress",
            Self::BlendModeChanged { .. } => "motion:blend-mode-changed",
            Self::MotionPresetSaved { .. } => "preset:saved",
            Self::MotionPresetDeleted { .. } => "preset:deleted",
            Self::MotionPresetApplied { .. } => "preset:applied",
            Self::TransitionStarted { .. } => "transition:started",
            Self::TransitionCompleted { .. } => "transition:completed",
            Self::TransitionCancelled { .. } => "transition:cancelled",
            Self::InteractionStarted => "interaction:started",
            Self::InteractionEnded => "interaction:ended",
        }
    }
}

type Listener = Box<dyn FnMut(&CameraEvent)>;

struct ListenerEntry {
    id: u64,
    prefix: Option<&'static str>,
    callback: Listener,
}

impl ListenerEntry {
    fn accepts(&self, event: &CameraEvent) -> bool {
        self.prefix
            .map_or(true, |prefix| event.name().starts_with(prefix))
    }
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<ListenerEntry>,
    queue: VecDeque<CameraEvent>,
    removed: Vec<u64>,
    dispatching: bool,
}

/// Shared publish/subscribe bus; clones publish to the same listeners
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to every event
    pub fn subscribe(&self, callback: impl FnMut(&CameraEvent) + 'static) -> Subscription {
        self.register(None, Box::new(callback))
    }

    /// Listen to events whose name starts with `prefix`, e.g. `"motion:"`
    pub fn subscribe_to(
        &self,
        prefix: &'static str,
        callback: impl FnMut(&CameraEvent) + 'static,
    ) -> Subscription {
        self.register(Some(prefix), Box::new(callback))
    }

    fn register(&self, prefix: Option<&'static str>, callback: Listener) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.listeners.push(ListenerEntry {
            id,
            prefix,
            callback,
        });
        Subscription {
            id,
            bus: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every matching listener
    pub fn emit(&self, event: CameraEvent) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.queue.push_back(event);
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }

        loop {
            let (event, mut listeners) = {
                let mut inner = self.inner.borrow_mut();
                match inner.queue.pop_front() {
                    Some(event) => (event, std::mem::take(&mut inner.listeners)),
                    None => {
                        inner.dispatching = false;
                        return;
                    }
                }
            };

            for entry in listeners.iter_mut().filter(|entry| entry.accepts(&event)) {
                (entry.callback)(&event);
            }

            let mut inner = self.inner.borrow_mut();
            let removed = std::mem::take(&mut inner.removed);
            listeners.append(&mut inner.listeners);
            listeners.retain(|entry| !removed.contains(&entry.id));
            inner.listeners = listeners;
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Remove every listener
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        let ids: Vec<u64> = inner.listeners.iter().map(|entry| entry.id).collect();
        if inner.dispatching {
            inner.removed.extend(ids);
        }
        inner.listeners.clear();
    }
}

fn unsubscribe(inner: &RefCell<BusInner>, id: u64) {
    let mut inner = inner.borrow_mut();
    if inner.dispatching {
        inner.removed.push(id);
    }
    inner.listeners.retain(|entry| entry.id != id);
}

/// Registration handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle keeps the listener registered.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    bus: Weak<RefCell<BusInner>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener; a no-op if the bus is gone
    pub fn unsubscribe(self) {
        if let Some(inner) = self.bus.upgrade() {
            unsubscribe(&inner, self.id);
        }
    }
}
