use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(rename = "busId", default)]
    pub bus_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    #[serde(rename = "busId")]
    pub bus_id: String,
    pub eta_minutes: f64,
    /// When the prediction ran, not when the GPS fix was taken.
    pub predicted_at: String,
}
