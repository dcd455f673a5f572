mod api;
mod config;
mod store;
mod types;

use std::net::SocketAddr;

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::Parser;
use eta_model::{FeatureVector, Predictor, DEFAULT_SPEED};
use tracing_subscriber::EnvFilter;

use api::AppState;
use config::Config;
use store::MongoGpsLogStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::parse();

    // No model, no service.
    let predictor = Predictor::load(&cfg.model_path)
        .with_context(|| format!("failed to load model from {:?}", cfg.model_path))?;

    let probe = FeatureVector::derive(0.0, 0.0, DEFAULT_SPEED, &NaiveDateTime::default())?;
    let eta = predictor.predict_features(&probe).context("warmup prediction failed")?;
    tracing::info!("warmup prediction ok ({eta} min)");

    let store = MongoGpsLogStore::connect(&cfg.mongo_uri, &cfg.mongo_db, &cfg.mongo_collection)
        .await
        .context("failed to set up MongoDB client")?;
    tracing::info!("using collection {}.{}", cfg.mongo_db, cfg.mongo_collection);

    let app = api::router(AppState::new(predictor, store));

    let addr = SocketAddr::new(cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
