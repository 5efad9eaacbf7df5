//! GUI entry point for the calibration guide.
//!
//! Run with: cargo run --bin gaze-calibrate-gui

use iced::window;
use tracing_subscriber::EnvFilter;

use gaze_calibration::gui::CalibrationApp;

fn main() -> iced::Result {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    iced::application(CalibrationApp::title, CalibrationApp::update, CalibrationApp::view)
        .subscription(CalibrationApp::subscription)
        .theme(CalibrationApp::theme)
        .style(CalibrationApp::style)
        .window(window::Settings {
            decorations: false,
            transparent: true,
            level: window::Level::AlwaysOnTop,
            ..window::Settings::default()
        })
        .run_with(CalibrationApp::new)
}
