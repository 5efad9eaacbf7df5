//! Fixed fixation targets and their on-screen positions.

use serde::{Deserialize, Serialize};

/// Default distance in pixels between a corner target and the screen edges.
pub const DEFAULT_MARGIN: u32 = 50;

/// One of the five fixation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalibrationTarget {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl CalibrationTarget {
    /// Presentation order, which is also the regression input order.
    pub const ALL: [CalibrationTarget; 5] = [
        CalibrationTarget::TopLeft,
        CalibrationTarget::TopRight,
        CalibrationTarget::BottomLeft,
        CalibrationTarget::BottomRight,
        CalibrationTarget::Center,
    ];

    /// Target presented at `step`, or `None` once every target was visited.
    pub fn at_step(step: usize) -> Option<Self> {
        Self::ALL.get(step).copied()
    }

    /// Position of the target in its place in [`CalibrationTarget::ALL`].
    pub fn index(self) -> usize {
        match self {
            CalibrationTarget::TopLeft => 0,
            CalibrationTarget::TopRight => 1,
            CalibrationTarget::BottomLeft => 2,
            CalibrationTarget::BottomRight => 3,
            CalibrationTarget::Center => 4,
        }
    }

    /// Identifier string, e.g. `TOP_LEFT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationTarget::TopLeft => "TOP_LEFT",
            CalibrationTarget::TopRight => "TOP_RIGHT",
            CalibrationTarget::BottomLeft => "BOTTOM_LEFT",
            CalibrationTarget::BottomRight => "BOTTOM_RIGHT",
            CalibrationTarget::Center => "CENTER",
        }
    }

    /// Human readable name, e.g. `TOP LEFT`.
    pub fn label(&self) -> &'static str {
        match self {
            CalibrationTarget::TopLeft => "TOP LEFT",
            CalibrationTarget::TopRight => "TOP RIGHT",
            CalibrationTarget::BottomLeft => "BOTTOM LEFT",
            CalibrationTarget::BottomRight => "BOTTOM RIGHT",
            CalibrationTarget::Center => "CENTER",
        }
    }

    /// Screen position of the target for the given geometry.
    ///
    /// The center uses integer division, so an odd width puts it half a
    /// pixel to the left of the true middle.
    pub fn screen_point(self, width: u32, height: u32, margin: u32) -> (u32, u32) {
        match self {
            CalibrationTarget::TopLeft => (margin, margin),
            CalibrationTarget::TopRight => (width - margin, margin),
            CalibrationTarget::BottomLeft => (margin, height - margin),
            CalibrationTarget::BottomRight => (width - margin, height - margin),
            CalibrationTarget::Center => (width / 2, height / 2),
        }
    }
}

impl std::fmt::Display for CalibrationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
