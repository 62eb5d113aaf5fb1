//! Scalar Record - one logged sample of one tag

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scalar Record represents a single scalar data point read from an event log.
///
/// Wall time is kept as fractional seconds since the Unix epoch, the way
/// event files store it, so that resampling can interpolate it like any
/// other column. Use [`ScalarRecord::recorded_at`] for a calendar timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalarRecord {
    tag: String,
    step: i64,
    wall_time: f64,
    value: f64,
}

impl ScalarRecord {
    /// Create a new scalar record.
    ///
    /// # Arguments
    ///
    /// * `tag` - Scalar tag (e.g., "train/loss", "eval/success_rate")
    /// * `step` - Global step the value was logged at
    /// * `wall_time` - Seconds since the Unix epoch
    /// * `value` - Scalar value
    #[must_use]
    pub fn new(tag: impl Into<String>, step: i64, wall_time: f64, value: f64) -> Self {
        Self {
            tag: tag.into(),
            step,
            wall_time,
            value,
        }
    }

    /// Create a builder that stamps the record with the current time.
    #[must_use]
    pub fn builder(tag: impl Into<String>, step: i64, value: f64) -> ScalarRecordBuilder {
        ScalarRecordBuilder::new(tag, step, value)
    }

    /// Get the scalar tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Get the global step.
    #[must_use]
    pub const fn step(&self) -> i64 {
        self.step
    }

    /// Get the wall time in seconds since the Unix epoch.
    #[must_use]
    pub const fn wall_time(&self) -> f64 {
        self.wall_time
    }

    /// Get the scalar value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Wall time as a UTC timestamp, `None` if it is out of chrono's range.
    #[must_use]
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        wall_time_to_utc(self.wall_time)
    }
}

/// Convert fractional epoch seconds to a UTC timestamp.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn wall_time_to_utc(wall_time: f64) -> Option<DateTime<Utc>> {
    if !wall_time.is_finite() {
        return None;
    }
    let secs = wall_time.floor();
    let nanos = ((wall_time - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos)
}

/// Convert a UTC timestamp to fractional epoch seconds.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn utc_to_wall_time(timestamp: DateTime<Utc>) -> f64 {
    timestamp.timestamp() as f64 + f64::from(timestamp.timestamp_subsec_nanos()) * 1e-9
}

/// Builder for `ScalarRecord`.
#[derive(Debug)]
pub struct ScalarRecordBuilder {
    tag: String,
    step: i64,
    value: f64,
    timestamp: DateTime<Utc>,
}

impl ScalarRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(tag: impl Into<String>, step: i64, value: f64) -> Self {
        Self {
            tag: tag.into(),
            step,
            value,
            timestamp: Utc::now(),
        }
    }

    /// Set a custom timestamp.
    #[must_use]
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Build the `ScalarRecord`.
    #[must_use]
    pub fn build(self) -> ScalarRecord {
        ScalarRecord {
            tag: self.tag,
            step: self.step,
            wall_time: utc_to_wall_time(self.timestamp),
            value: self.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_scalar_record_new() {
        let record = ScalarRecord::new("train/loss", 10, 1_700_000_000.5, 0.25);
        assert_eq!(record.tag(), "train/loss");
        assert_eq!(record.step(), 10);
        assert!((record.value() - 0.25).abs() < f64::EPSILON);
        assert!((record.wall_time() - 1_700_000_000.5).abs() < 1e-9);
    }

    #[test]
    fn test_recorded_at_keeps_subsecond_precision() {
        let record = ScalarRecord::new("loss", 0, 1_700_000_000.25, 0.0);
        let ts = record.recorded_at().unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_recorded_at_rejects_nan() {
        let record = ScalarRecord::new("loss", 0, f64::NAN, 0.0);
        assert!(record.recorded_at().is_none());
    }

    #[test]
    fn test_builder_uses_explicit_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let record = ScalarRecord::builder("accuracy", 100, 0.95)
            .timestamp(ts)
            .build();
        assert_eq!(record.recorded_at(), Some(ts));
    }
}
