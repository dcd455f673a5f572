use std::{net::IpAddr, path::PathBuf};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "eta-service")]
#[command(about = "HTTP service predicting bus ETAs from the latest GPS log")]
pub struct Config {
    /// MongoDB connection string
    #[arg(long, env = "MONGO_URI", hide_env_values = true)]
    pub mongo_uri: String,

    #[arg(long, env = "MONGO_DB", default_value = "Bus_Tracker")]
    pub mongo_db: String,

    #[arg(long, env = "MONGO_COLLECTION", default_value = "gpslogs")]
    pub mongo_collection: String,

    /// Trained model artifact produced by eta-trainer
    #[arg(long, env = "MODEL_PATH", default_value = "model/eta_model.json")]
    pub model_path: PathBuf,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(short, long, env = "PORT", default_value_t = 5001)]
    pub port: u16,
}
