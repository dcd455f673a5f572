//! Feature derivation, the gradient-boosted ETA estimator and its on-disk
//! artifact, shared by the trainer and the prediction service.

pub mod dataset;
pub mod error;
pub mod features;
pub mod model;
pub mod predictor;

pub use dataset::{load_csv, read_csv, TrainingRow, REQUIRED_COLUMNS};
pub use error::{DataError, FeatureError, ModelError, PredictError};
pub use features::{
    parse_timestamp, FeatureVector, GpsSample, DEFAULT_SPEED, FEATURE_COUNT, FEATURE_NAMES,
};
pub use model::{BoostParams, EtaModel};
pub use predictor::{round_eta, Predictor};
