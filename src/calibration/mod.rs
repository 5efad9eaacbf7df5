//! Five-point gaze calibration.

mod fit;
mod session;
mod target;

pub use fit::{fit_linear, mean, Axis, FitError, GazeMapping, GazeSample, LinearFit};
pub use session::{
    CalibrationConfig, CalibrationError, CalibrationSession, CalibrationState, SamplingMode,
    DEFAULT_DWELL_TIME,
};
pub use target::{CalibrationTarget, DEFAULT_MARGIN};
