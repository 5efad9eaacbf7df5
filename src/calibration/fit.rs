//! Least-squares line fitting from gaze space to screen space.
//!
//! Each screen axis is fitted independently as `screen = slope * gaze + intercept`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while fitting a mapping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Need at least 2 points for a linear fit, got {0}")]
    NotEnoughPoints(usize),
    #[error("Gaze values on the {axis} axis are all identical, fit is ill-conditioned")]
    IllConditioned { axis: Axis },
}

/// Screen axis a fit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// A raw gaze coordinate in input-device space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GazeSample {
    pub x: f64,
    pub y: f64,
}

impl GazeSample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

impl From<(f64, f64)> for GazeSample {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// First-degree polynomial `screen = slope * gaze + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Map one gaze coordinate to a screen coordinate.
    pub fn apply(&self, gaze: f64) -> f64 {
        self.slope * gaze + self.intercept
    }

    /// Coefficients as `(slope, intercept)`.
    pub fn coefficients(&self) -> (f64, f64) {
        (self.slope, self.intercept)
    }
}

/// Independent per-axis fits produced by a finished calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeMapping {
    pub x: LinearFit,
    pub y: LinearFit,
}

impl GazeMapping {
    /// Fit both axes from paired `(gaze, screen)` correspondences.
    pub fn fit(
        pairs: &[(GazeSample, (f64, f64))],
        tolerate_ill_conditioned: bool,
    ) -> Result<Self, FitError> {
        let x_points: Vec<(f64, f64)> = pairs.iter().map(|(g, s)| (g.x, s.0)).collect();
        let y_points: Vec<(f64, f64)> = pairs.iter().map(|(g, s)| (g.y, s.1)).collect();

        Ok(Self {
            x: fit_linear(Axis::X, &x_points, tolerate_ill_conditioned)?,
            y: fit_linear(Axis::Y, &y_points, tolerate_ill_conditioned)?,
        })
    }

    /// Predicted screen position for a raw gaze sample.
    pub fn apply(&self, sample: GazeSample) -> (f64, f64) {
        (self.x.apply(sample.x), self.y.apply(sample.y))
    }

    pub fn fit_for(&self, axis: Axis) -> &LinearFit {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }
}

/// Ordinary least-squares fit over `(gaze, screen)` points.
///
/// When every gaze value is numerically identical the slope is undefined. With
/// `tolerate_ill_conditioned` the result degrades to a flat line through the
/// mean screen coordinate; otherwise [`FitError::IllConditioned`] is returned.
pub fn fit_linear(
    axis: Axis,
    points: &[(f64, f64)],
    tolerate_ill_conditioned: bool,
) -> Result<LinearFit, FitError> {
    if points.len() < 2 {
        return Err(FitError::NotEnoughPoints(points.len()));
    }

    let n = points.len() as f64;
    let mean_gaze = points.iter().map(|(g, _)| g).sum::<f64>() / n;
    let mean_screen = points.iter().map(|(_, s)| s).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (g, s) in points {
        let dg = g - mean_gaze;
        sxx += dg * dg;
        sxy += dg * (s - mean_screen);
    }

    // Relative threshold so large raw coordinates don't hide a zero spread.
    let magnitude: f64 = points.iter().map(|(g, _)| g * g).sum();
    if sxx <= f64::EPSILON * magnitude {
        if !tolerate_ill_conditioned {
            return Err(FitError::IllConditioned { axis });
        }
        tracing::warn!(
            "Ill-conditioned {} axis fit (gaze spread {:e}), using flat mapping",
            axis,
            sxx
        );
        return Ok(LinearFit {
            slope: 0.0,
            intercept: mean_screen,
        });
    }

    let slope = sxy / sxx;
    Ok(LinearFit {
        slope,
        intercept: mean_screen - slope * mean_gaze,
    })
}

/// Per-axis mean of a sample sequence, `None` if it is empty.
pub fn mean(samples: &[GazeSample]) -> Option<GazeSample> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    Some(GazeSample {
        x: samples.iter().map(|s| s.axis(Axis::X)).sum::<f64>() / n,
        y: samples.iter().map(|s| s.axis(Axis::Y)).sum::<f64>() / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_fit_exact_line() {
        let points = [(35.0, 50.0), (485.0, 950.0), (35.0, 50.0), (485.0, 950.0), (260.0, 500.0)];
        let fit = fit_linear(Axis::X, &points, true).unwrap();
        assert!((fit.slope - 2.0).abs() < EPS);
        assert!((fit.intercept + 20.0).abs() < EPS);
        assert!((fit.apply(100.0) - 180.0).abs() < EPS);
    }

    #[test]
    fn test_fit_is_order_independent() {
        let points = vec![(1.0, 3.1), (2.0, 4.9), (3.0, 7.2), (4.0, 8.8), (5.0, 11.0)];
        let mut reversed = points.clone();
        reversed.reverse();
        let mut shuffled = points.clone();
        shuffled.swap(0, 3);
        shuffled.swap(1, 4);

        let a = fit_linear(Axis::Y, &points, true).unwrap();
        let b = fit_linear(Axis::Y, &reversed, true).unwrap();
        let c = fit_linear(Axis::Y, &shuffled, true).unwrap();
        assert!((a.slope - b.slope).abs() < EPS && (a.slope - c.slope).abs() < EPS);
        assert!((a.intercept - b.intercept).abs() < EPS);
        assert!((a.intercept - c.intercept).abs() < EPS);
    }

    #[test]
    fn test_fit_least_squares_noisy() {
        // Known OLS answer for these points: slope 1.97, intercept 1.09.
        let points = [(1.0, 3.1), (2.0, 4.9), (3.0, 7.2), (4.0, 8.8), (5.0, 11.0)];
        let fit = fit_linear(Axis::X, &points, true).unwrap();
        assert!((fit.slope - 1.97).abs() < EPS);
        assert!((fit.intercept - 1.09).abs() < EPS);
    }

    #[test]
    fn test_ill_conditioned_tolerated() {
        let points = [(7.0, 50.0), (7.0, 950.0), (7.0, 50.0), (7.0, 950.0), (7.0, 500.0)];
        let fit = fit_linear(Axis::X, &points, true).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 500.0).abs() < EPS);
    }

    #[test]
    fn test_ill_conditioned_strict() {
        let points = [(0.0, 1.0), (0.0, 2.0)];
        let err = fit_linear(Axis::Y, &points, false).unwrap_err();
        assert_eq!(err, FitError::IllConditioned { axis: Axis::Y });
    }

    #[test]
    fn test_not_enough_points() {
        let err = fit_linear(Axis::X, &[(1.0, 1.0)], true).unwrap_err();
        assert_eq!(err, FitError::NotEnoughPoints(1));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        let m = mean(&[GazeSample::new(1.0, 10.0), GazeSample::new(3.0, 20.0)]).unwrap();
        assert_eq!(m, GazeSample::new(2.0, 15.0));
    }

    #[test]
    fn test_mapping_uses_paired_axes() {
        let pairs = [
            (GazeSample::new(0.0, 10.0), (0.0, 100.0)),
            (GazeSample::new(10.0, 20.0), (30.0, 200.0)),
            (GazeSample::new(20.0, 30.0), (60.0, 300.0)),
        ];
        let mapping = GazeMapping::fit(&pairs, true).unwrap();
        assert!((mapping.x.slope - 3.0).abs() < EPS);
        assert!(mapping.x.intercept.abs() < EPS);
        assert!((mapping.y.slope - 10.0).abs() < EPS);
        assert!(mapping.y.intercept.abs() < EPS);

        let (sx, sy) = mapping.apply(GazeSample::new(5.0, 15.0));
        assert!((sx - 15.0).abs() < EPS);
        assert!((sy - 150.0).abs() < EPS);
    }
}
