//! Dwell-gated calibration session.
//!
//! A session walks through the five [`CalibrationTarget`]s in order. For each
//! target the first `record` call starts a dwell timer; the first call at or
//! after `dwell_time` has elapsed accepts a fixation and moves to the next
//! target. Once every target holds samples the per-axis mapping is fitted.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fit::{mean, FitError, GazeMapping, GazeSample};
use super::target::{CalibrationTarget, DEFAULT_MARGIN};

/// Default minimum dwell per target.
pub const DEFAULT_DWELL_TIME: Duration = Duration::from_millis(1500);

/// Errors raised when a session cannot be constructed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("Invalid screen dimensions {width}x{height}")]
    InvalidScreen { width: u32, height: u32 },
    #[error("Dwell time must be a positive, finite duration")]
    InvalidDwellTime,
    #[error("Margin {margin} leaves no room for targets on a {width}x{height} screen")]
    MarginTooLarge { margin: u32, width: u32, height: u32 },
}

/// How samples are gathered for a target while dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Keep only the sample that completes the dwell.
    #[default]
    SingleSample,
    /// Keep every sample recorded while the dwell timer runs.
    DwellWindow,
}

impl SamplingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingMode::SingleSample => "single",
            SamplingMode::DwellWindow => "window",
        }
    }

    /// Parse `single` or `window`; anything else falls back to single.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "window" | "dwell_window" | "average" => SamplingMode::DwellWindow,
            _ => SamplingMode::SingleSample,
        }
    }
}

/// Configuration for a calibration session.
#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    /// Minimum time a target must be dwelled on before a sample is accepted
    pub dwell_time: Duration,
    /// Distance of corner targets from the screen edges
    pub margin: u32,
    /// Sample collection policy
    pub sampling_mode: SamplingMode,
    /// Accept a degenerate fit instead of failing when gaze values don't vary
    pub tolerate_ill_conditioned: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            dwell_time: DEFAULT_DWELL_TIME,
            margin: DEFAULT_MARGIN,
            sampling_mode: SamplingMode::SingleSample,
            tolerate_ill_conditioned: true,
        }
    }
}

impl CalibrationConfig {
    pub fn with_dwell_time(mut self, dwell_time: Duration) -> Self {
        self.dwell_time = dwell_time;
        self
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_sampling_mode(mut self, mode: SamplingMode) -> Self {
        self.sampling_mode = mode;
        self
    }

    pub fn with_tolerate_ill_conditioned(mut self, tolerate: bool) -> Self {
        self.tolerate_ill_conditioned = tolerate;
        self
    }
}

/// Observable state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Collecting { step: usize, dwelling: bool },
    Completed,
}

/// State of one calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    screen_width: u32,
    screen_height: u32,
    config: CalibrationConfig,
    samples: [Vec<GazeSample>; 5],
    current_step: usize,
    dwell_start: Option<Instant>,
    completed: bool,
    outcome: Option<Result<GazeMapping, FitError>>,
}

impl CalibrationSession {
    /// Create a session for a screen of the given size.
    pub fn new(
        screen_width: u32,
        screen_height: u32,
        config: CalibrationConfig,
    ) -> Result<Self, CalibrationError> {
        if screen_width == 0 || screen_height == 0 {
            return Err(CalibrationError::InvalidScreen {
                width: screen_width,
                height: screen_height,
            });
        }
        if config.dwell_time.is_zero() {
            return Err(CalibrationError::InvalidDwellTime);
        }
        let span = config.margin.saturating_mul(2);
        if span >= screen_width || span >= screen_height {
            return Err(CalibrationError::MarginTooLarge {
                margin: config.margin,
                width: screen_width,
                height: screen_height,
            });
        }

        Ok(Self {
            screen_width,
            screen_height,
            config,
            samples: Default::default(),
            current_step: 0,
            dwell_start: None,
            completed: false,
            outcome: None,
        })
    }

    /// Feed one gaze sample observed at `at`.
    ///
    /// Returns `true` when the sample completed a dwell and the session moved
    /// on to the next target (or finished). Calls on a finished session are
    /// ignored and return `false`.
    pub fn record(&mut self, gaze: impl Into<GazeSample>, at: Instant) -> bool {
        if self.completed {
            return false;
        }
        let gaze = gaze.into();

        let Some(start) = self.dwell_start else {
            self.dwell_start = Some(at);
            tracing::debug!("Dwell started on {}", self.target_label());
            return false;
        };

        if at.saturating_duration_since(start) < self.config.dwell_time {
            if self.config.sampling_mode == SamplingMode::DwellWindow {
                self.samples[self.current_step].push(gaze);
            }
            return false;
        }

        let target = CalibrationTarget::ALL[self.current_step];
        self.samples[self.current_step].push(gaze);
        self.current_step += 1;
        self.dwell_start = None;
        tracing::info!(
            "Accepted fixation on {} at ({:.1}, {:.1}), step {}/{}",
            target,
            gaze.x,
            gaze.y,
            self.current_step,
            CalibrationTarget::ALL.len()
        );

        if self.current_step >= CalibrationTarget::ALL.len() {
            self.completed = true;
            self.compute_mapping();
        }
        true
    }

    fn compute_mapping(&mut self) {
        let pairs: Vec<(GazeSample, (f64, f64))> = CalibrationTarget::ALL
            .iter()
            .filter_map(|&target| {
                let gaze = mean(&self.samples[target.index()])?;
                let (sx, sy) = self.screen_point(target);
                Some((gaze, (sx as f64, sy as f64)))
            })
            .collect();

        let outcome = GazeMapping::fit(&pairs, self.config.tolerate_ill_conditioned);
        match &outcome {
            Ok(mapping) => tracing::info!(
                "Calibration mapping: x = {:.4} * gx + {:.4}, y = {:.4} * gy + {:.4}",
                mapping.x.slope,
                mapping.x.intercept,
                mapping.y.slope,
                mapping.y.intercept
            ),
            Err(e) => tracing::error!("Calibration fit failed: {}", e),
        }
        self.outcome = Some(outcome);
    }

    fn target_label(&self) -> &'static str {
        self.current_target().map(|t| t.as_str()).unwrap_or("none")
    }

    /// Screen position of `target` for this session's geometry.
    pub fn screen_point(&self, target: CalibrationTarget) -> (u32, u32) {
        target.screen_point(self.screen_width, self.screen_height, self.config.margin)
    }

    /// Target currently being collected, `None` once completed.
    pub fn current_target(&self) -> Option<CalibrationTarget> {
        CalibrationTarget::at_step(self.current_step)
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_dwelling(&self) -> bool {
        self.dwell_start.is_some()
    }

    pub fn state(&self) -> CalibrationState {
        if self.completed {
            CalibrationState::Completed
        } else {
            CalibrationState::Collecting {
                step: self.current_step,
                dwelling: self.is_dwelling(),
            }
        }
    }

    /// Samples collected so far for `target`.
    pub fn samples(&self, target: CalibrationTarget) -> &[GazeSample] {
        &self.samples[target.index()]
    }

    /// Fitted mapping, available once the session completed successfully.
    pub fn mapping(&self) -> Option<&GazeMapping> {
        self.outcome.as_ref().and_then(|o| o.as_ref().ok())
    }

    /// Fit failure, only possible with a strict ill-conditioning policy.
    pub fn fit_error(&self) -> Option<&FitError> {
        self.outcome.as_ref().and_then(|o| o.as_ref().err())
    }

    /// `(slope, intercept)` for the x axis.
    pub fn coeff_x(&self) -> Option<(f64, f64)> {
        self.mapping().map(|m| m.x.coefficients())
    }

    /// `(slope, intercept)` for the y axis.
    pub fn coeff_y(&self) -> Option<(f64, f64)> {
        self.mapping().map(|m| m.y.coefficients())
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }
}
