use std::path::Path;

use crate::error::{ModelError, PredictError};
use crate::features::{FeatureVector, GpsSample};
use crate::model::EtaModel;

/// Round to two decimals, ties to even.
pub fn round_eta(minutes: f64) -> f64 {
    (minutes * 100.0).round_ties_even() / 100.0
}

/// A loaded estimator. Read-only after construction, so one instance can
/// be shared across threads.
pub struct Predictor {
    model: EtaModel,
}

impl Predictor {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let model = EtaModel::load(path)?;
        tracing::info!(
            "loaded model {:?}: {} boosting rounds, trained on {} rows at {}",
            path,
            model.params().iterations,
            model.trained_rows(),
            model.trained_at()
        );
        Ok(Self { model })
    }

    pub fn from_model(model: EtaModel) -> Self {
        Self { model }
    }

    /// ETA in minutes for one raw reading.
    pub fn predict(
        &self,
        lat: f64,
        long: f64,
        speed: f64,
        timestamp: &str,
    ) -> Result<f64, PredictError> {
        let features = FeatureVector::derive_from_text(lat, long, speed, timestamp)?;
        Ok(self.predict_features(&features)?)
    }

    pub fn predict_features(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        self.model.predict(features).map(round_eta)
    }

    /// Predict from a stored sample, returning the features that were used.
    pub fn predict_sample(&self, sample: &GpsSample) -> Result<(FeatureVector, f64), PredictError> {
        let features = FeatureVector::from_sample(sample)?;
        let eta = self.predict_features(&features)?;
        Ok((features, eta))
    }
}
