//! Offline replay of recorded gaze samples.
//!
//! Input is plain text, one sample per line: `<seconds> <x> <y>`, where
//! `seconds` is a monotonic offset from the start of the recording. Blank
//! lines and lines starting with `#` are skipped. Fields may be separated by
//! whitespace or commas.

use std::io::BufRead;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::calibration::{CalibrationConfig, CalibrationError, CalibrationSession, GazeSample};

/// Errors from reading a recording.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line {line}: expected `<seconds> <x> <y>`, got {content:?}")]
    Malformed { line: usize, content: String },
    #[error("Line {line}: invalid timestamp {value}")]
    InvalidTimestamp { line: usize, value: f64 },
    #[error("Sample {index}: offset {offset:?} is out of range for the session clock")]
    OffsetOutOfRange { index: usize, offset: Duration },
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

/// One recorded sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedSample {
    /// Offset from the start of the recording
    pub offset: Duration,
    pub gaze: GazeSample,
}

/// Parse a recording into samples, in file order.
pub fn parse_samples<R: BufRead>(reader: R) -> Result<Vec<TimedSample>, ReplayError> {
    let mut samples = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line_no = idx + 1;

        let fields: Vec<f64> = trimmed
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty())
            .map(|f| f.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| ReplayError::Malformed {
                line: line_no,
                content: trimmed.to_string(),
            })?;

        let [secs, x, y] = fields[..] else {
            return Err(ReplayError::Malformed {
                line: line_no,
                content: trimmed.to_string(),
            });
        };

        let offset = Duration::try_from_secs_f64(secs).map_err(|_| {
            ReplayError::InvalidTimestamp {
                line: line_no,
                value: secs,
            }
        })?;

        samples.push(TimedSample {
            offset,
            gaze: GazeSample::new(x, y),
        });
    }

    Ok(samples)
}

/// Run a fresh session over recorded samples.
///
/// Feeding stops as soon as the session completes. The returned session may
/// still be incomplete if the recording was too short.
pub fn replay(
    samples: &[TimedSample],
    screen_width: u32,
    screen_height: u32,
    config: CalibrationConfig,
) -> Result<CalibrationSession, ReplayError> {
    let mut session = CalibrationSession::new(screen_width, screen_height, config)?;
    let start = Instant::now();

    for (index, sample) in samples.iter().enumerate() {
        if session.is_completed() {
            break;
        }
        let at = start
            .checked_add(sample.offset)
            .ok_or(ReplayError::OffsetOutOfRange {
                index,
                offset: sample.offset,
            })?;
        session.record(sample.gaze, at);
    }

    tracing::debug!(
        "Replayed {} samples, reached step {}",
        samples.len(),
        session.current_step()
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_samples() {
        let input = "# t x y\n0.0 10 20\n\n0.05, 11.5, 21\n  1.5\t12 22  \n";
        let samples = parse_samples(Cursor::new(input)).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].offset, Duration::ZERO);
        assert_eq!(samples[1].gaze, GazeSample::new(11.5, 21.0));
        assert_eq!(samples[2].offset, Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_samples(Cursor::new("0.0 1 2\n0.1 abc 2\n")).unwrap_err();
        assert!(matches!(err, ReplayError::Malformed { line: 2, .. }));

        let err = parse_samples(Cursor::new("0.0 1\n")).unwrap_err();
        assert!(matches!(err, ReplayError::Malformed { line: 1, .. }));
    }

    #[test]
    fn test_parse_negative_timestamp() {
        let err = parse_samples(Cursor::new("-1.0 1 2\n")).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidTimestamp { line: 1, .. }));
    }

    #[test]
    fn test_replay_completes() {
        // Five targets at 1000x800, gaze = screen / 2 + 10, polled at 20 Hz.
        let gaze = [(35.0, 35.0), (485.0, 35.0), (35.0, 385.0), (485.0, 385.0), (260.0, 210.0)];
        let mut samples = Vec::new();
        let mut tick = 0u64;
        for (x, y) in gaze {
            for _ in 0..32 {
                samples.push(TimedSample {
                    offset: Duration::from_millis(tick * 50),
                    gaze: GazeSample::new(x, y),
                });
                tick += 1;
            }
        }

        let session = replay(&samples, 1000, 800, CalibrationConfig::default()).unwrap();
        assert!(session.is_completed());
        let mapping = session.mapping().unwrap();
        assert!((mapping.x.slope - 2.0).abs() < 1e-6);
        assert!((mapping.y.intercept + 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_replay_rejects_huge_offset() {
        let samples = parse_samples(Cursor::new("0 1 2\n1e19 1 2\n")).unwrap();
        assert_eq!(samples.len(), 2);

        let err = replay(&samples, 1000, 800, CalibrationConfig::default()).unwrap_err();
        assert!(matches!(err, ReplayError::OffsetOutOfRange { index: 1, .. }));
    }

    #[test]
    fn test_replay_invalid_config() {
        let config = CalibrationConfig::default().with_dwell_time(Duration::ZERO);
        let err = replay(&[], 1000, 800, config).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Calibration(CalibrationError::InvalidDwellTime)
        ));
    }

    #[test]
    fn test_replay_too_short() {
        let samples = [TimedSample {
            offset: Duration::ZERO,
            gaze: GazeSample::new(1.0, 1.0),
        }];
        let session = replay(&samples, 1000, 800, CalibrationConfig::default()).unwrap();
        assert!(!session.is_completed());
        assert_eq!(session.current_step(), 0);
    }
}
