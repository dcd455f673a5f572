use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use eta_model::BoostParams;

#[derive(Parser, Debug)]
#[command(name = "eta-trainer")]
#[command(about = "Train the bus ETA model from historical GPS logs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fit a model on a CSV of GPS logs and write the artifact
    Train(TrainArgs),
    /// Predict one ETA with an existing artifact
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV with lat,long,speed,timestamp,eta_minutes columns
    #[arg(long, env = "ETA_DATA", default_value = "data/gps_logs.csv")]
    pub data: PathBuf,

    /// Where to write the model; an existing file is replaced
    #[arg(long, env = "ETA_MODEL_PATH", default_value = "model/eta_model.json")]
    pub model_out: PathBuf,

    /// Boosting rounds
    #[arg(long, env = "ETA_ITERATIONS", default_value_t = 100)]
    pub iterations: usize,

    #[arg(long, env = "ETA_MAX_DEPTH", default_value_t = 6)]
    pub max_depth: u32,

    /// Learning rate applied to each tree
    #[arg(long, env = "ETA_SHRINKAGE", default_value_t = 0.1)]
    pub shrinkage: f32,
}

impl TrainArgs {
    pub fn boost_params(&self) -> BoostParams {
        BoostParams {
            iterations: self.iterations,
            max_depth: self.max_depth,
            shrinkage: self.shrinkage,
            ..BoostParams::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long, env = "ETA_MODEL_PATH", default_value = "model/eta_model.json")]
    pub model: PathBuf,

    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub long: f64,

    #[arg(long, default_value_t = eta_model::DEFAULT_SPEED)]
    pub speed: f64,

    /// ISO-8601 timestamp, e.g. 2025-04-10T15:45:00
    #[arg(long)]
    pub timestamp: String,
}
