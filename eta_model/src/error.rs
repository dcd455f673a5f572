use std::path::PathBuf;
use thiserror::Error;

/// Failures turning raw telemetry into a feature vector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unrecognized timestamp {0:?}")]
    ParseError(String),
}

/// Failures reading the historical training dataset.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to open dataset {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("dataset has no rows")]
    Empty,

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// Failures fitting, persisting, loading or applying the estimator.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model unavailable at {path:?}: {reason}")]
    ModelUnavailable { path: PathBuf, reason: String },

    #[error("estimator failed: {0}")]
    Prediction(String),

    #[error("cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    #[error("failed to write model {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ModelError::ModelUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Anything the predictor can fail with once it is loaded.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
