use chrono::NaiveDateTime;
use serde_json::Value;

use crate::error::PollError;

/// Column holding the sample timestamp (`YYYY-MM-DD HH:MM:SS.fff`).
pub const TIMESTAMP_COLUMN: usize = 0;
/// Column holding the wind speed in km/s.
pub const SPEED_COLUMN: usize = 2;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Most recent row of the published series.
#[derive(Debug, Clone, PartialEq)]
pub struct WindSample {
    /// Wind speed in km/s.
    pub speed: f64,
    /// Sample time when the row carries a parseable timestamp.
    pub observed_at: Option<NaiveDateTime>,
}

/// Expected wind speed domain mapped linearly onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRange {
    min: f64,
    max: f64,
}

impl SpeedRange {
    pub const DEFAULT_MIN: f64 = 250.0;
    pub const DEFAULT_MAX: f64 = 800.0;

    /// Returns `None` unless both bounds are finite and `max > min`.
    pub fn new(min: f64, max: f64) -> Option<Self> {
        (min.is_finite() && max.is_finite() && max > min).then_some(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Rescales `speed` into `[0, 1]`, clamping values outside the domain.
    pub fn normalize(&self, speed: f64) -> f32 {
        ((speed - self.min) / (self.max - self.min)).clamp(0.0, 1.0) as f32
    }
}

impl Default for SpeedRange {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

/// Parses a JSON array of rows and extracts the last one.
///
/// Only the last row is inspected, so a leading header row
/// (`["time_tag","density","speed",...]`) is harmless as long as data follows.
pub fn latest_sample(body: &str) -> Result<WindSample, PollError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    let row = rows.last().ok_or(PollError::EmptySeries)?;

    let speed = match row.get(SPEED_COLUMN) {
        None | Some(Value::Null) => {
            return Err(PollError::MissingSpeed {
                columns: row.len(),
            })
        }
        Some(Value::String(raw)) => parse_speed(raw)?,
        Some(Value::Number(number)) => number
            .as_f64()
            .filter(|speed| speed.is_finite())
            .ok_or_else(|| PollError::InvalidSpeed {
                raw: number.to_string(),
            })?,
        Some(other) => {
            return Err(PollError::InvalidSpeed {
                raw: other.to_string(),
            })
        }
    };

    let observed_at = row
        .get(TIMESTAMP_COLUMN)
        .and_then(Value::as_str)
        .and_then(|raw| NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok());

    Ok(WindSample { speed, observed_at })
}

fn parse_speed(raw: &str) -> Result<f64, PollError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|speed| speed.is_finite())
        .ok_or_else(|| PollError::InvalidSpeed {
            raw: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_below_and_above_domain() {
        let range = SpeedRange::default();
        assert_eq!(range.normalize(0.0), 0.0);
        assert_eq!(range.normalize(250.0), 0.0);
        assert_eq!(range.normalize(800.0), 1.0);
        assert_eq!(range.normalize(1500.0), 1.0);
    }

    #[test]
    fn normalize_is_linear_and_monotonic_inside_domain() {
        let range = SpeedRange::default();
        let mut last = 0.0;
        for speed in (251..800).step_by(7) {
            let value = range.normalize(speed as f64);
            let expected = ((speed as f64 - 250.0) / 550.0) as f32;
            assert!((value - expected).abs() < 1e-6);
            assert!(value > last);
            last = value;
        }
    }

    #[test]
    fn rejects_degenerate_ranges() {
        assert!(SpeedRange::new(800.0, 250.0).is_none());
        assert!(SpeedRange::new(300.0, 300.0).is_none());
        assert!(SpeedRange::new(f64::NAN, 800.0).is_none());
        assert!(SpeedRange::new(100.0, 900.0).is_some());
    }

    #[test]
    fn picks_the_last_row() {
        let body = r#"[
            ["time_tag","density","speed","temperature"],
            ["2024-05-01 12:00:00.000","3.1","300","81000"],
            ["2024-05-01 12:05:00.000","3.4","500","82000"]
        ]"#;
        let sample = latest_sample(body).expect("sample");
        assert_eq!(sample.speed, 500.0);
        let observed = sample.observed_at.expect("timestamp");
        assert_eq!(observed.to_string(), "2024-05-01 12:05:00");

        let value = SpeedRange::default().normalize(sample.speed);
        assert!((value - 0.4545).abs() < 1e-3);
    }

    #[test]
    fn accepts_numeric_speed_and_odd_timestamps() {
        let sample = latest_sample(r#"[[1714564800, 2.0, 612.5]]"#).expect("sample");
        assert_eq!(sample.speed, 612.5);
        assert!(sample.observed_at.is_none());
    }

    #[test]
    fn reports_malformed_payloads() {
        assert!(matches!(latest_sample("not json"), Err(PollError::Json(_))));
        assert!(matches!(latest_sample(r#"{"speed": 1}"#), Err(PollError::Json(_))));
        assert!(matches!(latest_sample("[]"), Err(PollError::EmptySeries)));
        assert!(matches!(
            latest_sample(r#"[["2024-05-01 12:00:00.000","3.1"]]"#),
            Err(PollError::MissingSpeed { columns: 2 })
        ));
        assert!(matches!(
            latest_sample(r#"[["2024-05-01 12:00:00.000","3.1",null]]"#),
            Err(PollError::MissingSpeed { .. })
        ));
        assert!(matches!(
            latest_sample(r#"[["time_tag","density","speed"]]"#),
            Err(PollError::InvalidSpeed { .. })
        ));
    }
}
