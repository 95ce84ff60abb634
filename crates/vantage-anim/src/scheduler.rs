use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use tracing::debug;
use vantage_core::math::lerp;
use vantage_core::Easing;

/// Callback invoked every tick with `(current_value, progress)`
pub type UpdateFn = Box<dyn FnMut(f32, f32)>;
/// Callback invoked once when an animation reaches its end
pub type CompleteFn = Box<dyn FnOnce()>;

/// Opaque identity of a scheduled or queued animation.
///
/// Handles stay valid as values after the animation ends; operations on a
/// finished handle are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationHandle(u64);

impl AnimationHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Description of a tween to run.
pub struct AnimationSpec {
    /// Duration in seconds; non-positive durations finish on the next tick
    pub duration: f32,
    pub easing: Easing,
    pub from: f32,
    pub to: f32,
    on_update: Option<UpdateFn>,
    on_complete: Option<CompleteFn>,
}

impl AnimationSpec {
    /// A linear 0 → 1 tween over `duration` seconds
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            easing: Easing::Linear,
            from: 0.0,
            to: 1.0,
            on_update: None,
            on_complete: None,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn range(mut self, from: f32, to: f32) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn on_update(mut self, f: impl FnMut(f32, f32) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for AnimationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationSpec")
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

/// Snapshot of a running animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationInfo {
    pub id: AnimationHandle,
    /// Scheduler time in seconds when the animation started
    pub start_time: f64,
    pub duration: f32,
    pub progress: f32,
    pub is_paused: bool,
}

/// Completion of an animation whose callback has not run yet.
///
/// The scheduler hands these back instead of invoking `on_complete` itself,
/// so callers can release any borrow of the scheduler before running them.
#[must_use = "completion callbacks only run when `run` is called"]
pub struct Completion {
    handle: AnimationHandle,
    callback: Option<CompleteFn>,
}

impl Completion {
    pub fn handle(&self) -> AnimationHandle {
        self.handle
    }

    pub fn run(self) {
        if let Some(callback) = self.callback {
            callback();
        }
    }
}

struct Animation {
    handle: AnimationHandle,
    start_time: f64,
    duration: f32,
    easing: Easing,
    from: f32,
    to: f32,
    elapsed: f32,
    progress: f32,
    paused: bool,
    on_update: Option<UpdateFn>,
    on_complete: Option<CompleteFn>,
}

impl Animation {
    fn progress_at(&self, elapsed: f32) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    fn sample(&mut self, progress: f32) {
        self.progress = progress;
        let value = lerp(self.from, self.to, self.easing.apply(progress));
        if let Some(on_update) = self.on_update.as_mut() {
            on_update(value, progress);
        }
    }

    fn is_finished(&self) -> bool {
        self.progress >= 1.0
    }

    fn info(&self) -> AnimationInfo {
        AnimationInfo {
            id: self.handle,
            start_time: self.start_time,
            duration: self.duration,
            progress: self.progress,
            is_paused: self.paused,
        }
    }

    fn into_completion(self, fire: bool) -> Completion {
        Completion {
            handle: self.handle,
            callback: if fire { self.on_complete } else { None },
        }
    }
}

struct QueueEntry {
    handle: AnimationHandle,
    priority: i32,
    spec: AnimationSpec,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // Highest priority first; equal priorities run in enqueue order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

/// Keyed tween runner.
///
/// Scheduled animations run concurrently and independently. Enqueued
/// animations run one at a time in priority order alongside them.
#[derive(Default)]
pub struct AnimationScheduler {
    time: f64,
    next_id: u64,
    active: Vec<Animation>,
    queue: BinaryHeap<QueueEntry>,
    queue_running: Option<AnimationHandle>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    fn allocate(&mut self) -> AnimationHandle {
        self.next_id += 1;
        AnimationHandle(self.next_id)
    }

    fn start(&mut self, handle: AnimationHandle, spec: AnimationSpec) {
        debug!(
            id = handle.0,
            duration = spec.duration,
            easing = spec.easing.name(),
            "animation scheduled"
        );
        self.active.push(Animation {
            handle,
            start_time: self.time,
            duration: spec.duration,
            easing: spec.easing,
            from: spec.from,
            to: spec.to,
            elapsed: 0.0,
            progress: 0.0,
            paused: false,
            on_update: spec.on_update,
            on_complete: spec.on_complete,
        });
    }

    /// Start an animation; its first update happens on the next tick
    pub fn schedule(&mut self, spec: AnimationSpec) -> AnimationHandle {
        let handle = self.allocate();
        self.start(handle, spec);
        handle
    }

    /// Queue an animation for sequential execution.
    ///
    /// Queued animations start one after another, highest `priority` first.
    pub fn enqueue(&mut self, spec: AnimationSpec, priority: i32) -> AnimationHandle {
        let handle = self.allocate();
        self.queue.push(QueueEntry {
            handle,
            priority,
            spec,
        });
        self.start_next_queued();
        handle
    }

    fn start_next_queued(&mut self) {
        if self.queue_running.is_some() {
            return;
        }
        if let Some(entry) = self.queue.pop() {
            self.queue_running = Some(entry.handle);
            self.start(entry.handle, entry.spec);
        }
    }

    /// Drop every queued animation that has not started yet
    pub fn clear_queue(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    /// Advance every running animation by `dt` seconds.
    ///
    /// Returns the completions of animations that reached progress 1 this tick.
    pub fn tick(&mut self, dt: f32) -> Vec<Completion> {
        let dt = dt.max(0.0);
        self.time += dt as f64;

        for animation in self.active.iter_mut().filter(|a| !a.paused) {
            animation.elapsed += dt;
            let progress = animation.progress_at(animation.elapsed);
            animation.sample(progress);
        }

        let mut completions = Vec::new();
        let mut index = 0;
        while index < self.active.len() {
            if self.active[index].is_finished() {
                let animation = self.active.remove(index);
                debug!(id = animation.handle.0, "animation completed");
                if self.queue_running == Some(animation.handle) {
                    self.queue_running = None;
                }
                completions.push(animation.into_completion(true));
            } else {
                index += 1;
            }
        }

        self.start_next_queued();
        completions
    }

    /// Stop an animation.
    ///
    /// With `snap_to_end` one final update at progress 1 is issued and the
    /// returned completion carries `on_complete`; otherwise the value stays
    /// at its last computed point. Returns `None` for unknown handles.
    pub fn cancel(&mut self, handle: AnimationHandle, snap_to_end: bool) -> Option<Completion> {
        if let Some(index) = self.active.iter().position(|a| a.handle == handle) {
            let mut animation = self.active.remove(index);
            if snap_to_end {
                animation.sample(1.0);
            }
            debug!(id = handle.0, snap_to_end, "animation canceled");
            if self.queue_running == Some(handle) {
                self.queue_running = None;
                self.start_next_queued();
            }
            return Some(animation.into_completion(snap_to_end));
        }

        let before = self.queue.len();
        self.queue.retain(|entry| entry.handle != handle);
        if self.queue.len() < before {
            return Some(Completion {
                handle,
                callback: None,
            });
        }
        None
    }

    /// Stop every running animation; queued animations stay queued
    pub fn cancel_all(&mut self, snap_to_end: bool) -> Vec<Completion> {
        self.queue_running = None;
        std::mem::take(&mut self.active)
            .into_iter()
            .map(|mut animation| {
                if snap_to_end {
                    animation.sample(1.0);
                }
                animation.into_completion(snap_to_end)
            })
            .collect()
    }

    pub fn pause(&mut self, handle: AnimationHandle) -> bool {
        self.set_paused(handle, true)
    }

    pub fn resume(&mut self, handle: AnimationHandle) -> bool {
        self.set_paused(handle, false)
    }

    fn set_paused(&mut self, handle: AnimationHandle, paused: bool) -> bool {
        match self.active.iter_mut().find(|a| a.handle == handle) {
            Some(animation) => {
                animation.paused = paused;
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, handle: AnimationHandle) -> bool {
        self.active.iter().any(|a| a.handle == handle)
    }

    pub fn is_queued(&self, handle: AnimationHandle) -> bool {
        self.queue.iter().any(|entry| entry.handle == handle)
    }

    pub fn info(&self, handle: AnimationHandle) -> Option<AnimationInfo> {
        self.active
            .iter()
            .find(|a| a.handle == handle)
            .map(Animation::info)
    }

    pub fn active_animations(&self) -> Vec<AnimationInfo> {
        self.active.iter().map(Animation::info).collect()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether anything is running or waiting in the queue
    pub fn has_pending(&self) -> bool {
        !self.active.is_empty() || !self.queue.is_empty()
    }

    /// Drop everything without running callbacks and rewind the clock
    pub fn reset(&mut self) {
        self.active.clear();
        self.queue.clear();
        self.queue_running = None;
        self.time = 0.0;
    }
}
