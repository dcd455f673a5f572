use std::{fs::File, io::Read, path::Path};

use serde::Deserialize;

use crate::error::DataError;
use crate::features::{FeatureVector, DEFAULT_SPEED};

pub const REQUIRED_COLUMNS: [&str; 5] = ["lat", "long", "speed", "timestamp", "eta_minutes"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    lat: f64,
    long: f64,
    speed: Option<f64>,
    timestamp: String,
    eta_minutes: f64,
}

/// One historical observation ready for fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub features: FeatureVector,
    pub eta_minutes: f64,
}

pub fn load_csv(path: &Path) -> Result<Vec<TrainingRow>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file)
}

/// Read `lat,long,speed,timestamp,eta_minutes` rows from any reader.
/// Column order is free and extra columns are ignored.
pub fn read_csv<R: Read>(input: R) -> Result<Vec<TrainingRow>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let line = i + 2;
        let raw = result.map_err(|e| DataError::InvalidRow {
            row: line,
            reason: e.to_string(),
        })?;
        let features = FeatureVector::derive_from_text(
            raw.lat,
            raw.long,
            raw.speed.unwrap_or(DEFAULT_SPEED),
            &raw.timestamp,
        )
        .map_err(|e| DataError::InvalidRow {
            row: line,
            reason: e.to_string(),
        })?;
        if !raw.eta_minutes.is_finite() {
            return Err(DataError::InvalidRow {
                row: line,
                reason: format!("eta_minutes {} is not a number", raw.eta_minutes),
            });
        }
        rows.push(TrainingRow {
            features,
            eta_minutes: raw.eta_minutes,
        });
    }

    if rows.is_empty() {
        return Err(DataError::Empty);
    }
    Ok(rows)
}
