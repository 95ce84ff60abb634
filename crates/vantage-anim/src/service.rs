use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use glam::Vec3;
use vantage_core::{Easing, Lerp};

use crate::scheduler::{
    AnimationHandle, AnimationInfo, AnimationScheduler, AnimationSpec, CompleteFn, Completion,
};

/// Options for a typed tween
pub struct TweenOptions<T> {
    /// Duration in seconds
    pub duration: f32,
    /// Curve to use; each `animate_*` call picks its own default when unset
    pub easing: Option<Easing>,
    on_update: Option<Box<dyn FnMut(T, f32)>>,
    on_complete: Option<CompleteFn>,
}

impl<T> TweenOptions<T> {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            easing: None,
            on_update: None,
            on_complete: None,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn on_update(mut self, f: impl FnMut(T, f32) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl<T> fmt::Debug for TweenOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenOptions")
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .finish_non_exhaustive()
    }
}

struct TweenSlot<T> {
    value: Cell<T>,
    progress: Cell<f32>,
}

/// A running typed tween.
///
/// The current value is written by the scheduler on every tick and can be
/// read at any time, including after the tween finished or was canceled.
pub struct Tween<T: Copy> {
    handle: AnimationHandle,
    from: T,
    to: T,
    slot: Rc<TweenSlot<T>>,
}

impl<T: Copy> Clone for Tween<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            from: self.from,
            to: self.to,
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for Tween<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("handle", &self.handle)
            .field("value", &self.value())
            .field("progress", &self.progress())
            .finish()
    }
}

impl<T: Copy> Tween<T> {
    pub fn handle(&self) -> AnimationHandle {
        self.handle
    }

    /// Last computed value
    pub fn value(&self) -> T {
        self.slot.value.get()
    }

    /// Last computed linear progress
    pub fn progress(&self) -> f32 {
        self.slot.progress.get()
    }

    pub fn from(&self) -> T {
        self.from
    }

    pub fn to(&self) -> T {
        self.to
    }
}

/// Typed animation layer over a shared [`AnimationScheduler`].
///
/// Cloning yields another handle to the same scheduler. Update callbacks run
/// while the scheduler is borrowed and must not call back into the service;
/// completion callbacks run after the borrow is released.
#[derive(Clone, Default)]
pub struct AnimationService {
    scheduler: Rc<RefCell<AnimationScheduler>>,
}

impl AnimationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Animate a raw number; defaults to a linear sweep
    pub fn animate_number(&self, from: f32, to: f32, options: TweenOptions<f32>) -> Tween<f32> {
        let easing = options.easing.unwrap_or(Easing::Linear);
        self.animate_with(from, to, easing, options)
    }

    /// Animate a vector; defaults to ease-out-cubic
    pub fn animate_vec3(&self, from: Vec3, to: Vec3, options: TweenOptions<Vec3>) -> Tween<Vec3> {
        let easing = options.easing.unwrap_or(Easing::EaseOutCubic);
        self.animate_with(from, to, easing, options)
    }

    /// Animate any interpolable value; defaults to ease-out-cubic
    pub fn animate<T: Lerp + 'static>(&self, from: T, to: T, options: TweenOptions<T>) -> Tween<T> {
        let easing = options.easing.unwrap_or(Easing::EaseOutCubic);
        self.animate_with(from, to, easing, options)
    }

    fn animate_with<T: Lerp + 'static>(
        &self,
        from: T,
        to: T,
        easing: Easing,
        options: TweenOptions<T>,
    ) -> Tween<T> {
        let slot = Rc::new(TweenSlot {
            value: Cell::new(from),
            progress: Cell::new(0.0),
        });
        let writer = Rc::clone(&slot);
        let mut on_update = options.on_update;

        let mut spec = AnimationSpec::new(options.duration)
            .easing(easing)
            .on_update(move |eased, progress| {
                let value = T::lerp(&from, &to, eased);
                writer.value.set(value);
                writer.progress.set(progress);
                if let Some(callback) = on_update.as_mut() {
                    callback(value, progress);
                }
            });
        if let Some(on_complete) = options.on_complete {
            spec = spec.on_complete(on_complete);
        }

        let handle = self.scheduler.borrow_mut().schedule(spec);
        Tween {
            handle,
            from,
            to,
            slot,
        }
    }

    /// Schedule a raw animation spec
    pub fn schedule(&self, spec: AnimationSpec) -> AnimationHandle {
        self.scheduler.borrow_mut().schedule(spec)
    }

    /// Queue a raw animation spec for priority-ordered sequential execution
    pub fn enqueue(&self, spec: AnimationSpec, priority: i32) -> AnimationHandle {
        self.scheduler.borrow_mut().enqueue(spec, priority)
    }

    pub fn clear_queue(&self) -> usize {
        self.scheduler.borrow_mut().clear_queue()
    }

    /// Advance all animations and run completion callbacks
    pub fn tick(&self, dt: f32) {
        let completions = self.scheduler.borrow_mut().tick(dt);
        run_all(completions);
    }

    /// Cancel one animation; returns whether it was still running or queued
    pub fn cancel(&self, handle: AnimationHandle, snap_to_end: bool) -> bool {
        let completion = self.scheduler.borrow_mut().cancel(handle, snap_to_end);
        match completion {
            Some(completion) => {
                completion.run();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self, snap_to_end: bool) {
        let completions = self.scheduler.borrow_mut().cancel_all(snap_to_end);
        run_all(completions);
    }

    pub fn pause(&self, handle: AnimationHandle) -> bool {
        self.scheduler.borrow_mut().pause(handle)
    }

    pub fn resume(&self, handle: AnimationHandle) -> bool {
        self.scheduler.borrow_mut().resume(handle)
    }

    pub fn is_active(&self, handle: AnimationHandle) -> bool {
        self.scheduler.borrow().is_active(handle)
    }

    pub fn info(&self, handle: AnimationHandle) -> Option<AnimationInfo> {
        self.scheduler.borrow().info(handle)
    }

    pub fn active_animations(&self) -> Vec<AnimationInfo> {
        self.scheduler.borrow().active_animations()
    }

    /// True while anything is running or queued
    pub fn is_animating(&self) -> bool {
        self.scheduler.borrow().has_pending()
    }

    /// Drop all animations without running callbacks
    pub fn reset(&self) {
        self.scheduler.borrow_mut().reset();
    }
}

fn run_all(completions: Vec<Completion>) {
    for completion in completions {
        completion.run();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animate_number_is_linear_by_default() {
        let service = AnimationService::new();
        let tween = service.animate_number(0.0, 10.0, TweenOptions::new(1.0));
        assert_eq!(tween.value(), 0.0);

        service.tick(0.25);
        assert!((tween.value() - 2.5).abs() < 1e-5);
        assert!((tween.progress() - 0.25).abs() < 1e-6);
        assert!(service.is_animating());
    }

    #[test]
    fn test_animate_vec3_eases_out() {
        let service = AnimationService::new();
        let tween = service.animate_vec3(Vec3::ZERO, Vec3::X, TweenOptions::new(1.0));
        service.tick(0.5);
        // Ease-out covers more than half the distance at the midpoint
        assert!(tween.value().x > 0.5);

        service.tick(0.5);
        assert_eq!(tween.value(), Vec3::X);
        assert!(!service.is_animating());
    }

    #[test]
    fn test_callbacks_fire() {
        let service = AnimationService::new();
        let updates = Rc::new(Cell::new(0));
        let completed = Rc::new(Cell::new(false));
        let (u, c) = (Rc::clone(&updates), Rc::clone(&completed));
        service.animate_number(
            0.0,
            1.0,
            TweenOptions::new(0.5)
                .on_update(move |_, _| u.set(u.get() + 1))
                .on_complete(move || c.set(true)),
        );

        service.tick(0.25);
        service.tick(0.25);
        assert_eq!(updates.get(), 2);
        assert!(completed.get());
    }

    #[test]
    fn test_completion_may_schedule_more_work() {
        let service = AnimationService::new();
        let chained = service.clone();
        service.animate_number(
            0.0,
            1.0,
            TweenOptions::new(0.1).on_complete(move || {
                chained.animate_number(1.0, 2.0, TweenOptions::new(0.1));
            }),
        );

        service.tick(0.2);
        assert_eq!(service.active_animations().len(), 1);
    }

    #[test]
    fn test_cancel_semantics() {
        let service = AnimationService::new();
        let snapped = service.animate_number(0.0, 8.0, TweenOptions::new(1.0));
        let held = service.animate_number(0.0, 8.0, TweenOptions::new(1.0));
        service.tick(0.5);

        assert!(service.cancel(snapped.handle(), true));
        assert!(service.cancel(held.handle(), false));
        assert_eq!(snapped.value(), 8.0);
        assert!((held.value() - 4.0).abs() < 1e-5);
        assert!(!service.cancel(held.handle(), false));
    }

    #[test]
    fn test_queued_work_counts_as_animating() {
        let service = AnimationService::new();
        service.enqueue(AnimationSpec::new(1.0), 0);
        service.enqueue(AnimationSpec::new(1.0), 0);
        service.cancel_all(false);
        assert!(service.is_animating());
        assert_eq!(service.clear_queue(), 1);
        assert!(!service.is_animating());
    }
}
