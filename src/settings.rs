//! Shared settings for the calibration CLI and GUI.
//! Persisted in the platform-specific config directory via `directories::ProjectDirs`.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::calibration::{
    CalibrationConfig, CalibrationError, SamplingMode, DEFAULT_DWELL_TIME, DEFAULT_MARGIN,
};

/// Application settings that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Minimum dwell per target in seconds
    pub dwell_time_secs: f64,
    /// Corner target distance from the screen edges
    pub margin: u32,
    /// Input polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Sampling mode ("single_sample" or "dwell_window")
    pub sampling_mode: SamplingMode,
    /// Accept degenerate fits instead of failing
    pub tolerate_ill_conditioned: bool,
    /// Delay before the guide window closes after completion, in milliseconds
    pub close_delay_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            dwell_time_secs: DEFAULT_DWELL_TIME.as_secs_f64(),
            margin: DEFAULT_MARGIN,
            poll_interval_ms: 50,
            sampling_mode: SamplingMode::SingleSample,
            tolerate_ill_conditioned: true,
            close_delay_ms: 1000,
        }
    }
}

impl AppSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "gazecal", "gaze-calibration")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, then apply environment overrides.
    pub fn load() -> Self {
        let mut loaded = Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default();
        loaded.apply_env_overrides();
        loaded
    }

    /// Load settings from `path` without environment overrides.
    pub fn load_from(path: &Path) -> Self {
        let defaults = Self::default();

        let mut loaded: Self = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();

        // Older or hand-edited files may carry zeroes
        if loaded.dwell_time_secs <= 0.0 || !loaded.dwell_time_secs.is_finite() {
            loaded.dwell_time_secs = defaults.dwell_time_secs;
        }
        if loaded.poll_interval_ms == 0 {
            loaded.poll_interval_ms = defaults.poll_interval_ms;
        }

        loaded
    }

    /// Override fields from `CALIBRATION_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        if let Some(secs) = env::var("CALIBRATION_DWELL_SECS")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|s| *s > 0.0 && s.is_finite())
        {
            self.dwell_time_secs = secs;
        }
        if let Some(margin) = env::var("CALIBRATION_MARGIN").ok().and_then(|s| s.parse::<u32>().ok()) {
            self.margin = margin;
        }
        if let Some(ms) = env::var("CALIBRATION_POLL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
        {
            self.poll_interval_ms = ms;
        }
        if let Ok(mode) = env::var("CALIBRATION_SAMPLING") {
            self.sampling_mode = SamplingMode::from_str_lossy(&mode);
        }
        if let Ok(strict) = env::var("CALIBRATION_STRICT") {
            self.tolerate_ill_conditioned = !(strict == "1" || strict.to_lowercase() == "true");
        }
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<(), String> {
        let path = Self::settings_path().ok_or("Cannot determine config directory")?;
        self.save_to(&path)
    }

    /// Save settings to `path`, creating its parent directory.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(path, content).map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(())
    }

    /// Write the default settings file on first run so it can be edited.
    ///
    /// Returns the path when a file was created.
    pub fn write_defaults_if_missing() -> Result<Option<PathBuf>, String> {
        let path = Self::settings_path().ok_or("Cannot determine config directory")?;
        Self::write_defaults_at(&path)
    }

    fn write_defaults_at(path: &Path) -> Result<Option<PathBuf>, String> {
        if path.exists() {
            return Ok(None);
        }
        Self::default().save_to(path)?;
        Ok(Some(path.to_path_buf()))
    }

    /// Get logs directory path.
    pub fn logs_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "gazecal", "gaze-calibration")
            .map(|dirs| dirs.data_dir().join("logs"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.close_delay_ms)
    }

    /// Session configuration described by these settings.
    ///
    /// A negative, non-finite or zero dwell time is rejected.
    pub fn calibration_config(&self) -> Result<CalibrationConfig, CalibrationError> {
        let dwell_time = Duration::try_from_secs_f64(self.dwell_time_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or(CalibrationError::InvalidDwellTime)?;
        Ok(CalibrationConfig::default()
            .with_dwell_time(dwell_time)
            .with_margin(self.margin)
            .with_sampling_mode(self.sampling_mode)
            .with_tolerate_ill_conditioned(self.tolerate_ill_conditioned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_calibration_config() {
        let config = AppSettings::default().calibration_config().unwrap();
        assert_eq!(config.dwell_time, Duration::from_millis(1500));
        assert_eq!(config.margin, 50);
        assert_eq!(config.sampling_mode, SamplingMode::SingleSample);
        assert!(config.tolerate_ill_conditioned);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"dwell_time_secs": 0.5, "sampling_mode": "dwell_window"}"#)
                .unwrap();
        assert_eq!(settings.dwell_time_secs, 0.5);
        assert_eq!(settings.sampling_mode, SamplingMode::DwellWindow);
        assert_eq!(settings.poll_interval_ms, 50);
        assert_eq!(settings.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_settings_roundtrip_json() {
        let settings = AppSettings {
            margin: 80,
            tolerate_ill_conditioned: false,
            ..AppSettings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_invalid_dwell_is_rejected() {
        for secs in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            let settings = AppSettings {
                dwell_time_secs: secs,
                ..AppSettings::default()
            };
            assert_eq!(
                settings.calibration_config().unwrap_err(),
                CalibrationError::InvalidDwellTime,
                "dwell {}",
                secs
            );
        }
    }

    #[test]
    fn test_defaults_written_once() {
        let dir = std::env::temp_dir().join(format!("gaze-calibration-settings-{}", std::process::id()));
        let path = dir.join("settings.json");
        let _ = fs::remove_dir_all(&dir);

        assert_eq!(AppSettings::write_defaults_at(&path).unwrap(), Some(path.clone()));
        assert_eq!(AppSettings::load_from(&path), AppSettings::default());

        let edited = AppSettings {
            margin: 120,
            ..AppSettings::default()
        };
        edited.save_to(&path).unwrap();
        assert_eq!(AppSettings::write_defaults_at(&path).unwrap(), None);
        assert_eq!(AppSettings::load_from(&path).margin, 120);

        let _ = fs::remove_dir_all(&dir);
    }
}
