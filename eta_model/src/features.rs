use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// Column order fed to the estimator. Training and inference both go
/// through [`FeatureVector::to_array`], and the artifact records these names.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["lat", "long", "speed", "hour", "day_of_week"];
pub const FEATURE_COUNT: usize = 5;

/// Speed assumed when a record carries none.
pub const DEFAULT_SPEED: f64 = 30.0;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// One logged telemetry record for a bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsSample {
    pub bus_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub lat: f64,
    pub long: f64,
    pub speed: f64,
    /// 0..=23, wall-clock hour of the timestamp
    pub hour: u32,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
}

impl FeatureVector {
    /// Validate raw inputs and derive the calendar features.
    pub fn derive(
        lat: f64,
        long: f64,
        speed: f64,
        timestamp: &NaiveDateTime,
    ) -> Result<Self, FeatureError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(FeatureError::InvalidInput(format!("latitude {lat} out of range")));
        }
        if !long.is_finite() || !(-180.0..=180.0).contains(&long) {
            return Err(FeatureError::InvalidInput(format!("longitude {long} out of range")));
        }
        if !speed.is_finite() {
            return Err(FeatureError::InvalidInput(format!("speed {speed} is not a number")));
        }

        Ok(Self {
            lat,
            long,
            speed,
            hour: timestamp.hour(),
            day_of_week: timestamp.weekday().num_days_from_monday(),
        })
    }

    /// Same as [`derive`](Self::derive) but parses the timestamp from text first.
    pub fn derive_from_text(
        lat: f64,
        long: f64,
        speed: f64,
        timestamp: &str,
    ) -> Result<Self, FeatureError> {
        let ts = parse_timestamp(timestamp)?;
        Self::derive(lat, long, speed, &ts)
    }

    pub fn from_sample(sample: &GpsSample) -> Result<Self, FeatureError> {
        Self::derive(
            sample.latitude,
            sample.longitude,
            sample.speed.unwrap_or(DEFAULT_SPEED),
            &sample.timestamp,
        )
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.lat,
            self.long,
            self.speed,
            f64::from(self.hour),
            f64::from(self.day_of_week),
        ]
    }
}

/// Parse an ISO-8601-ish timestamp. Offsets are accepted but the hour and
/// weekday are taken from the wall clock of that offset.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, FeatureError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_local());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN));
    }

    Err(FeatureError::ParseError(text.to_string()))
}
