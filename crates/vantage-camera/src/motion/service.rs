//! Stateful procedural motion sampler

use tracing::{debug, info};
use vantage_core::CameraPose;

use super::trajectory::{MotionPreview, MotionTrajectory};
use super::types::{
    BlendMode, MotionConfig, MotionParam, MotionParams, MotionResult, MotionState, MotionStatus,
    MotionType,
};
use crate::config::MotionDefaults;
use crate::events::{CameraEvent, EventBus};

/// Procedural motion lifecycle and sampling.
///
/// Motion time is advanced explicitly with [`advance`](Self::advance) and
/// only moves while running, so pausing freezes the phase.
pub struct MotionService {
    defaults: MotionDefaults,
    events: EventBus,
    motion_type: MotionType,
    params: MotionParams,
    blend_mode: BlendMode,
    status: MotionStatus,
    /// Seconds of motion time since start
    elapsed: f32,
    /// Local clock (ms), advanced on every call to `advance`
    clock_ms: f64,
    start_time: f64,
    last_progress_event: f32,
}

impl MotionService {
    pub fn new(defaults: MotionDefaults, events: EventBus) -> Self {
        Self {
            params: defaults.params.clamped(),
            blend_mode: defaults.blend_mode,
            defaults,
            events,
            motion_type: MotionType::Static,
            status: MotionStatus::Stopped,
            elapsed: 0.0,
            clock_ms: 0.0,
            start_time: 0.0,
            last_progress_event: 0.0,
        }
    }

    /// Start a motion from phase zero.
    ///
    /// Without a config the current parameters and blend mode are kept.
    pub fn start(&mut self, motion_type: MotionType, config: Option<MotionConfig>) {
        if let Some(config) = config {
            self.params = config.params.clamped();
            self.set_blend_mode(config.blend_mode);
        }
        self.motion_type = motion_type;
        self.status = MotionStatus::Running;
        self.elapsed = 0.0;
        self.start_time = self.clock_ms;
        self.last_progress_event = 0.0;
        info!("Motion started: {}", motion_type.name());
        self.events.emit(CameraEvent::MotionStarted { motion_type });
    }

    /// Start by generator name; unknown names start `Static`
    pub fn start_by_name(&mut self, name: &str, config: Option<MotionConfig>) {
        self.start(MotionType::from_name(name), config);
    }

    pub fn stop(&mut self) {
        if self.status == MotionStatus::Stopped {
            return;
        }
        self.status = MotionStatus::Stopped;
        self.elapsed = 0.0;
        self.last_progress_event = 0.0;
        info!("Motion stopped");
        self.events.emit(CameraEvent::MotionStopped);
    }

    pub fn pause(&mut self) -> bool {
        if self.status != MotionStatus::Running {
            return false;
        }
        self.status = MotionStatus::Paused;
        let progress = self.progress();
        self.events.emit(CameraEvent::MotionPaused { progress });
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.status != MotionStatus::Paused {
            return false;
        }
        self.status = MotionStatus::Running;
        let progress = self.progress();
        self.events.emit(CameraEvent::MotionResumed { progress });
        true
    }

    /// Advance motion time by `dt` seconds while running
    pub fn advance(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.clock_ms += f64::from(dt) * 1000.0;
        if self.status != MotionStatus::Running {
            return;
        }
        self.elapsed += dt;

        let interval = self.defaults.progress_event_interval;
        if interval > 0.0 && self.elapsed - self.last_progress_event >= interval {
            self.last_progress_event = self.elapsed;
            let progress = self.progress();
            self.events.emit(CameraEvent::MotionProgress { progress });
        }
    }

    /// Pure sample of the active generator at `time` seconds.
    ///
    /// Uses a default base pose when none is given.
    pub fn calculate(&self, time: f32, base: Option<&CameraPose>) -> MotionResult {
        let fallback = CameraPose::default();
        let base = base.unwrap_or(&fallback);
        self.trajectory().sample(time, base)
    }

    /// Sample at the current motion time; identity while stopped
    pub fn sample(&self, base: &CameraPose) -> MotionResult {
        if self.status == MotionStatus::Stopped {
            return MotionResult::from_pose(base);
        }
        self.trajectory().sample(self.elapsed, base)
    }

    /// Generator bound to the current parameter snapshot
    pub fn trajectory(&self) -> MotionTrajectory {
        MotionTrajectory::new(
            self.motion_type,
            self.params,
            self.defaults.base_period,
            self.defaults.tracking_smoothing,
        )
    }

    /// Sample `samples + 1` points over `duration` seconds against the default pose
    pub fn generate_preview(&self, duration: f32, samples: usize) -> MotionPreview {
        self.trajectory().preview(duration, samples)
    }

    /// Update one knob without restarting the motion.
    ///
    /// Changing speed rescales motion time so the cyclic phase is kept.
    pub fn set_parameter(&mut self, param: MotionParam, value: f32) -> bool {
        let period = self.trajectory().period();
        if !self.params.set(param, value) {
            return false;
        }
        if param == MotionParam::Speed {
            let scale = self.trajectory().period() / period;
            self.elapsed *= scale;
            self.last_progress_event *= scale;
        }
        debug!(?param, value = self.params.get(param), "motion parameter set");
        true
    }

    /// Update a knob by its camelCase or snake_case name; unknown keys are ignored
    pub fn set_parameter_by_name(&mut self, name: &str, value: f32) -> bool {
        match MotionParam::from_name(name) {
            Some(param) => self.set_parameter(param, value),
            None => {
                debug!("Ignoring unknown motion parameter '{}'", name);
                false
            }
        }
    }

    /// Replace every knob at once, keeping phase
    pub fn set_params(&mut self, params: MotionParams) {
        for param in MotionParam::ALL {
            self.set_parameter(param, params.get(param));
        }
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        if self.blend_mode != mode {
            self.blend_mode = mode;
            info!("Blend mode set to {}", mode.name());
            self.events.emit(CameraEvent::BlendModeChanged { mode });
        }
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn motion_type(&self) -> MotionType {
        self.motion_type
    }

    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    pub fn config(&self) -> MotionConfig {
        MotionConfig {
            params: self.params,
            blend_mode: self.blend_mode,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Cyclic progress of the current period, 0..1
    pub fn progress(&self) -> f32 {
        if self.status == MotionStatus::Stopped {
            return 0.0;
        }
        self.trajectory().progress(self.elapsed)
    }

    pub fn status(&self) -> MotionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status != MotionStatus::Stopped
    }

    pub fn is_running(&self) -> bool {
        self.status == MotionStatus::Running
    }

    /// Whether sampling yields anything other than the base pose
    pub fn is_producing(&self) -> bool {
        self.is_active() && self.motion_type != MotionType::Static
    }

    pub fn state(&self) -> MotionState {
        MotionState {
            is_active: self.is_active(),
            is_paused: self.status == MotionStatus::Paused,
            motion_type: self.motion_type,
            progress: self.progress(),
            elapsed: self.elapsed,
            start_time: self.start_time,
        }
    }

    /// Stop silently and return to the configured defaults
    pub fn reset(&mut self) {
        self.motion_type = MotionType::Static;
        self.params = self.defaults.params.clamped();
        self.blend_mode = self.defaults.blend_mode;
        self.status = MotionStatus::Stopped;
        self.elapsed = 0.0;
        self.clock_ms = 0.0;
        self.start_time = 0.0;
        self.last_progress_event = 0.0;
    }
}
