//! Gaze Calibration - offline replay
//!
//! Runs a calibration session over a recorded sample file (or stdin) and
//! prints the fitted mapping as JSON.
//! Run with: cargo run --bin gaze-calibrate -- --width 1920 --height 1080 samples.txt

use anyhow::{bail, Context};
use gaze_calibration::calibration::CalibrationTarget;
use gaze_calibration::{parse_samples, replay, AppSettings, GazeMapping, GazeSample};
use serde::Serialize;
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct TargetReport {
    target: CalibrationTarget,
    screen: (u32, u32),
    samples: Vec<GazeSample>,
}

#[derive(Serialize)]
struct CalibrationReport {
    screen_width: u32,
    screen_height: u32,
    targets: Vec<TargetReport>,
    mapping: GazeMapping,
}

fn usage() -> &'static str {
    "Usage: gaze-calibrate [--width W] [--height H] [--dwell SECS] [--strict] [--window] [FILE]"
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> anyhow::Result<T> {
    let value = value.with_context(|| format!("Missing value for {}", flag))?;
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid value for {}: {}", flag, value))
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    // Screen geometry from environment, overridable by flags
    let mut width: u32 = env::var("SCREEN_WIDTH")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1920);
    let mut height: u32 = env::var("SCREEN_HEIGHT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1080);

    let mut settings = AppSettings::load();
    let mut input: Option<String> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--width" => width = parse_value("--width", iter.next())?,
            "--height" => height = parse_value("--height", iter.next())?,
            "--dwell" => settings.dwell_time_secs = parse_value("--dwell", iter.next())?,
            "--strict" => settings.tolerate_ill_conditioned = false,
            "--window" => settings.sampling_mode = gaze_calibration::SamplingMode::DwellWindow,
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(());
            }
            other if other.starts_with("--") => bail!("Unknown option {}\n{}", other, usage()),
            other => input = Some(other.to_string()),
        }
    }

    let config = settings
        .calibration_config()
        .context("Invalid calibration parameters")?;

    let samples = match &input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Cannot open {}", path))?;
            parse_samples(BufReader::new(file))
        }
        None => parse_samples(io::stdin().lock()),
    }
    .context("Failed to read gaze samples")?;

    eprintln!("🎯 Gaze Calibration");
    eprintln!("================================================");
    eprintln!("Screen: {}x{}", width, height);
    eprintln!("Dwell: {:.2}s", settings.dwell_time_secs);
    eprintln!("Sampling: {}", settings.sampling_mode.as_str());
    eprintln!("Samples: {}", samples.len());
    eprintln!("================================================");

    let session = replay(&samples, width, height, config).context("Replay failed")?;

    if !session.is_completed() {
        bail!(
            "Recording ended after {}/{} targets",
            session.current_step(),
            CalibrationTarget::ALL.len()
        );
    }
    if let Some(e) = session.fit_error() {
        bail!("Calibration fit failed: {}", e);
    }
    let mapping = *session
        .mapping()
        .context("Completed session has no mapping")?;

    let report = CalibrationReport {
        screen_width: width,
        screen_height: height,
        targets: CalibrationTarget::ALL
            .iter()
            .map(|&target| TargetReport {
                target,
                screen: session.screen_point(target),
                samples: session.samples(target).to_vec(),
            })
            .collect(),
        mapping,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    eprintln!(
        "\n✅ X = {:.4} * gx + {:.4}, Y = {:.4} * gy + {:.4}",
        mapping.x.slope, mapping.x.intercept, mapping.y.slope, mapping.y.intercept
    );

    Ok(())
}
