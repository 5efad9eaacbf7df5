// Copyright 2025 The gaze-calibration Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Gaze Calibration
//!
//! Dwell-gated five-point calibration that maps raw gaze (or cursor)
//! coordinates to screen coordinates with an independent least-squares line
//! per axis.
//!
//! A [`CalibrationSession`] is driven by an external polling loop. Each call
//! to [`CalibrationSession::record`] carries the sample and the instant it was
//! observed, so the session never reads a clock itself.
//!
//! ## Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use gaze_calibration::{CalibrationConfig, CalibrationSession, CalibrationTarget};
//!
//! let config = CalibrationConfig::default().with_dwell_time(Duration::from_millis(500));
//! let mut session = CalibrationSession::new(1000, 800, config).unwrap();
//!
//! let mut now = Instant::now();
//! for target in CalibrationTarget::ALL {
//!     let (x, y) = session.screen_point(target);
//!     let gaze = (x as f64 / 2.0 + 10.0, y as f64 / 2.0 + 10.0);
//!     session.record(gaze, now); // starts the dwell timer
//!     now += Duration::from_millis(500);
//!     assert!(session.record(gaze, now)); // dwell complete
//! }
//!
//! let (slope_x, intercept_x) = session.coeff_x().unwrap();
//! assert!((slope_x - 2.0).abs() < 1e-6);
//! assert!((intercept_x + 20.0).abs() < 1e-6);
//! ```

pub mod calibration;
pub mod gui;
pub mod replay;
pub mod settings;

pub use calibration::{
    CalibrationConfig, CalibrationError, CalibrationSession, CalibrationState, CalibrationTarget,
    FitError, GazeMapping, GazeSample, LinearFit, SamplingMode,
};
pub use replay::{parse_samples, replay, ReplayError, TimedSample};
pub use settings::AppSettings;
