//! Vantage Core - Core types and utilities for the Vantage camera engine
//!
//! This crate provides the foundational types used throughout the engine:
//! - Mathematical primitives (re-exported from glam)
//! - Camera pose and partial pose updates
//! - Named easing curves and interpolation helpers
//! - Frame clock for per-tick delta and elapsed time

pub mod easing;
pub mod math;
pub mod time;
pub mod types;

pub use easing::Easing;
pub use glam::{Mat4, Quat, Vec2, Vec3};
pub use math::Lerp;
pub use time::{ClockConfig, FrameClock};
pub use types::{CameraPose, PosePatch};
