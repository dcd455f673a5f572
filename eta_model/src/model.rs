use std::{
    fs,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use chrono::{DateTime, Utc};
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use crate::dataset::TrainingRow;
use crate::error::ModelError;
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

const FORMAT_VERSION: u32 = 2;

/// Gradient-boosted regression tree settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostParams {
    pub iterations: usize,
    pub max_depth: u32,
    pub shrinkage: f32,
    pub min_leaf_size: usize,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            max_depth: 6,
            shrinkage: 0.1,
            min_leaf_size: 1,
        }
    }
}

impl BoostParams {
    fn to_config(self) -> Config {
        let mut cfg = Config::new();
        cfg.set_feature_size(FEATURE_COUNT);
        cfg.set_iterations(self.iterations.max(1));
        cfg.set_max_depth(self.max_depth);
        cfg.set_shrinkage(self.shrinkage as ValueType);
        cfg.set_min_leaf_size(self.min_leaf_size.max(1));
        cfg.set_loss("SquaredError");
        // full rows and columns every round keeps training reproducible
        cfg.set_data_sample_ratio(1.0);
        cfg.set_feature_sample_ratio(1.0);
        cfg
    }
}

fn feature_values(features: &FeatureVector) -> Vec<ValueType> {
    features.to_array().iter().map(|v| *v as ValueType).collect()
}

/// The trained estimator plus the schema it was trained against.
#[derive(Serialize, Deserialize)]
pub struct EtaModel {
    format_version: u32,
    feature_names: Vec<String>,
    params: BoostParams,
    trained_rows: usize,
    trained_at: DateTime<Utc>,
    gbdt: GBDT,
}

impl EtaModel {
    /// Single fit over every row; no holdout.
    pub fn train(rows: &[TrainingRow], params: BoostParams) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let mut data: DataVec = rows
            .iter()
            .map(|r| {
                Data::new_training_data(
                    feature_values(&r.features),
                    1.0,
                    r.eta_minutes as ValueType,
                    None,
                )
            })
            .collect();

        let mut gbdt = GBDT::new(&params.to_config());
        gbdt.fit(&mut data);

        Ok(Self {
            format_version: FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            params,
            trained_rows: rows.len(),
            trained_at: Utc::now(),
            gbdt,
        })
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let test = vec![Data::new_test_data(feature_values(features), None)];
        let eta = self
            .gbdt
            .predict(&test)
            .first()
            .map(|v| *v as f64)
            .ok_or_else(|| ModelError::Prediction("estimator returned no output".into()))?;
        if !eta.is_finite() {
            return Err(ModelError::Prediction(format!("estimator returned {eta}")));
        }
        Ok(eta)
    }

    pub fn params(&self) -> &BoostParams {
        &self.params
    }

    pub fn trained_rows(&self) -> usize {
        self.trained_rows
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Write the artifact, replacing whatever is at `path`.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let io_err = |source: std::io::Error| ModelError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let mut out = BufWriter::new(fs::File::create(path).map_err(io_err)?);
        serde_json::to_writer(&mut out, self)?;
        out.flush().map_err(io_err)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let file = fs::File::open(path).map_err(|e| ModelError::unavailable(path, e))?;
        let model: EtaModel = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ModelError::unavailable(path, format!("corrupt artifact: {e}")))?;

        if model.format_version != FORMAT_VERSION {
            return Err(ModelError::unavailable(
                path,
                format!("unsupported format version {}", model.format_version),
            ));
        }
        if model.feature_names != FEATURE_NAMES {
            return Err(ModelError::unavailable(
                path,
                format!(
                    "feature schema {:?} does not match {:?}",
                    model.feature_names, FEATURE_NAMES
                ),
            ));
        }
        Ok(model)
    }
}
