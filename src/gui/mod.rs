//! Full-screen calibration guide.
//!
//! Provides the visual driver for a calibration session using Iced.

pub mod app;
pub mod logger;

pub use app::CalibrationApp;
pub use logger::{LogEntry, LogLevel, SessionLog};
