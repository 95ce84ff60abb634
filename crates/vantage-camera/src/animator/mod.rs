pub mod integrator;
pub mod sink;

pub use integrator::CameraAnimator;
pub use sink::{CameraSink, RecordingSink};
