//! Frame clock for the render-loop tick
//!
//! Converts the raw per-frame delta supplied by the host into a clamped delta
//! and a monotonically increasing elapsed time in milliseconds.

use serde::{Deserialize, Serialize};

/// Configuration for the frame clock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// How many engine seconds pass per real second
    pub time_scale: f32,
    /// Maximum delta time to prevent large jumps after a stall
    pub max_delta: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta: 0.25,
        }
    }
}

/// Per-frame time tracking
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    /// Configuration
    pub config: ClockConfig,
    /// Time since the clock started, in milliseconds
    pub elapsed_ms: f64,
    /// Delta time for this frame in seconds (clamped and scaled)
    pub delta: f32,
    /// Frame counter
    pub frame_count: u64,
    /// Whether the clock is paused
    pub paused: bool,
}

impl FrameClock {
    /// Create a new clock with custom config
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Advance the clock with the raw delta from the previous frame
    pub fn update(&mut self, raw_delta: f32) {
        self.frame_count += 1;

        if self.paused || !raw_delta.is_finite() {
            self.delta = 0.0;
            return;
        }

        self.delta = raw_delta.clamp(0.0, self.config.max_delta) * self.config.time_scale;
        self.elapsed_ms += self.delta as f64 * 1000.0;
    }

    /// Elapsed time in milliseconds
    pub fn now_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Set the time scale (0.0 = frozen, 1.0 = normal, 2.0 = double speed)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale.max(0.0);
    }

    /// Rewind to zero, keeping the configuration
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
