mod config;

use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use eta_model::{load_csv, EtaModel, Predictor};
use tracing_subscriber::EnvFilter;

use config::{Cli, Command, PredictArgs, TrainArgs};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Train(args) => train(&args),
        Command::Predict(args) => predict(&args),
    }
}

fn train(args: &TrainArgs) -> anyhow::Result<()> {
    let rows = load_csv(&args.data)
        .with_context(|| format!("failed to load training data from {:?}", args.data))?;
    tracing::info!("loaded {} rows from {:?}", rows.len(), args.data);

    let params = args.boost_params();
    let started = Instant::now();
    let model = EtaModel::train(&rows, params).context("model fit failed")?;
    tracing::info!(
        "fit {} boosting rounds in {:.2?} (max_depth={}, shrinkage={})",
        params.iterations,
        started.elapsed(),
        params.max_depth,
        params.shrinkage
    );

    model
        .save(&args.model_out)
        .with_context(|| format!("failed to save model to {:?}", args.model_out))?;
    tracing::info!("ETA model trained and saved to {:?}", args.model_out);
    Ok(())
}

fn predict(args: &PredictArgs) -> anyhow::Result<()> {
    let predictor = Predictor::load(&args.model)
        .with_context(|| format!("failed to load model from {:?}", args.model))?;
    let eta = predictor
        .predict(args.lat, args.long, args.speed, &args.timestamp)
        .context("prediction failed")?;
    println!("{eta}");
    Ok(())
}
