//! Vantage Anim - Tween scheduling for the Vantage camera engine
//!
//! [`AnimationScheduler`] runs keyed, eased tweens advanced by an explicit
//! `tick`. [`AnimationService`] shares one scheduler between services and
//! adds typed tweens for numbers, vectors, and poses.

mod scheduler;
mod service;

pub use scheduler::{
    AnimationHandle, AnimationInfo, AnimationScheduler, AnimationSpec, CompleteFn, Completion,
    UpdateFn,
};
pub use service::{AnimationService, Tween, TweenOptions};
