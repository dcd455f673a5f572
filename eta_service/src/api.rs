use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use eta_model::{FeatureError, ModelError, PredictError, Predictor};
use serde_json::json;
use thiserror::Error;

use crate::store::{GpsLogStore, StoreError};
use crate::types::{PredictRequest, PredictResponse};

// ---------- Server state ----------

pub struct AppState<S> {
    pub predictor: Arc<Predictor>,
    pub store: Arc<S>,
}

impl<S> AppState<S> {
    pub fn new(predictor: Predictor, store: S) -> Self {
        Self {
            predictor: Arc::new(predictor),
            store: Arc::new(store),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            predictor: Arc::clone(&self.predictor),
            store: Arc::clone(&self.store),
        }
    }
}

pub fn router<S: GpsLogStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/predict", post(predict::<S>))
        .route("/health", get(health))
        .with_state(state)
}

// ---------- Errors ----------

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("busId is required")]
    MissingBusId,

    #[error("busId is not a valid identifier")]
    InvalidBusId,

    #[error("No GPS log found for this bus")]
    NoGpsLog,

    #[error("{0}")]
    InvalidSample(#[from] FeatureError),

    #[error("GPS log lookup failed")]
    Lookup(#[source] StoreError),

    #[error("prediction failed: {0}")]
    Model(#[from] ModelError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) | ApiError::MissingBusId | ApiError::InvalidBusId => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NoGpsLog => StatusCode::NOT_FOUND,
            ApiError::InvalidSample(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Lookup(_) => StatusCode::BAD_GATEWAY,
            ApiError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidBusId(_) => ApiError::InvalidBusId,
            other => ApiError::Lookup(other),
        }
    }
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::Feature(e) => ApiError::InvalidSample(e),
            PredictError::Model(e) => ApiError::Model(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Lookup(source) => tracing::error!("{self}: {source}"),
            _ if status.is_server_error() => tracing::error!("{self}"),
            _ => tracing::warn!("{status}: {self}"),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ---------- Handlers ----------

async fn predict<S: GpsLogStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let bus_id = req
        .bus_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ApiError::MissingBusId)?;

    let sample = state
        .store
        .latest_for_bus(&bus_id)
        .await?
        .ok_or(ApiError::NoGpsLog)?;

    let (features, eta_minutes) = state.predictor.predict_sample(&sample)?;
    tracing::debug!(
        "bus={} features={:?} eta_minutes={}",
        bus_id,
        features.to_array(),
        eta_minutes
    );

    Ok(Json(PredictResponse {
        bus_id,
        eta_minutes,
        predicted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    }))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        body::{to_bytes, Body, Bytes},
        http::{Method, Request},
    };
    use chrono::DateTime;
    use eta_model::{
        parse_timestamp, BoostParams, EtaModel, FeatureVector, GpsSample, TrainingRow,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const BUS: &str = "64f1c2a9e4b0a1b2c3d4e5f6";

    #[derive(Default)]
    struct MemoryStore {
        logs: HashMap<String, Vec<GpsSample>>,
        broken: bool,
    }

    impl GpsLogStore for MemoryStore {
        async fn latest_for_bus(&self, bus_id: &str) -> Result<Option<GpsSample>, StoreError> {
            if self.broken {
                return Err(StoreError::Malformed("connection reset".into()));
            }
            if !bus_id.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(StoreError::InvalidBusId(bus_id.to_string()));
            }
            Ok(self
                .logs
                .get(bus_id)
                .and_then(|v| v.iter().max_by_key(|s| s.timestamp))
                .cloned())
        }
    }

    fn sample(ts: &str, lat: f64, speed: Option<f64>) -> GpsSample {
        GpsSample {
            bus_id: BUS.into(),
            latitude: lat,
            longitude: 77.5946,
            speed,
            timestamp: parse_timestamp(ts).unwrap(),
        }
    }

    fn predictor() -> Predictor {
        let rows: Vec<TrainingRow> = [
            (12.9716, 40.0, "2025-04-10T15:45:00", 11.0),
            (12.9500, 25.0, "2025-04-11T08:00:00", 19.0),
            (12.9900, 35.0, "2025-04-12T18:30:00", 6.5),
        ]
        .into_iter()
        .map(|(lat, speed, ts, eta)| TrainingRow {
            features: FeatureVector::derive_from_text(lat, 77.5946, speed, ts).unwrap(),
            eta_minutes: eta,
        })
        .collect();
        let params = BoostParams {
            iterations: 20,
            ..BoostParams::default()
        };
        Predictor::from_model(EtaModel::train(&rows, params).unwrap())
    }

    fn state(store: MemoryStore) -> AppState<MemoryStore> {
        AppState::new(predictor(), store)
    }

    async fn call(state: AppState<MemoryStore>, req: Request<Body>) -> (StatusCode, Bytes) {
        let resp = router(state).oneshot(req).await.unwrap();
        let status = resp.status();
        (status, to_bytes(resp.into_body(), usize::MAX).await.unwrap())
    }

    async fn send(state: AppState<MemoryStore>, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, bytes) = call(state, req).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_or_null_bus_id_is_400() {
        for body in [r#"{}"#, r#"{"busId": null}"#, r#"{"busId": "  "}"#] {
            let (status, json) = send(state(MemoryStore::default()), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json, json!({ "error": "busId is required" }));
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let (status, json) = send(state(MemoryStore::default()), "{busId").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().starts_with("invalid JSON body"));
    }

    #[tokio::test]
    async fn test_invalid_identifier_is_400() {
        let (status, json) = send(state(MemoryStore::default()), r#"{"busId": "not-an-id"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({ "error": "busId is not a valid identifier" }));
    }

    #[tokio::test]
    async fn test_unknown_bus_is_404() {
        let (status, json) = send(state(MemoryStore::default()), &format!(r#"{{"busId": "{BUS}"}}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, json!({ "error": "No GPS log found for this bus" }));
    }

    #[tokio::test]
    async fn test_latest_sample_drives_prediction() {
        let mut store = MemoryStore::default();
        store.logs.insert(
            BUS.into(),
            vec![
                sample("2025-04-09T07:00:00", 12.9500, Some(10.0)),
                sample("2025-04-10T15:45:00", 12.9716, Some(40.0)),
            ],
        );
        let st = state(store);
        let expected = st
            .predictor
            .predict_features(&FeatureVector {
                lat: 12.9716,
                long: 77.5946,
                speed: 40.0,
                hour: 15,
                day_of_week: 3,
            })
            .unwrap();

        let (status, json) = send(st, &format!(r#"{{"busId": "{BUS}"}}"#)).await;
        assert_eq!(status, StatusCode::OK);
        let out: PredictResponse = serde_json::from_value(json).unwrap();
        assert_eq!(out.bus_id, BUS);
        assert_eq!(out.eta_minutes, expected);
        assert!(out.eta_minutes >= 0.0);
        assert!(out.predicted_at.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&out.predicted_at).is_ok());
    }

    #[tokio::test]
    async fn test_out_of_range_sample_is_422() {
        let mut store = MemoryStore::default();
        store
            .logs
            .insert(BUS.into(), vec![sample("2025-04-10T15:45:00", 123.0, None)]);
        let (status, json) = send(state(store), &format!(r#"{{"busId": "{BUS}"}}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().unwrap().contains("latitude"));
    }

    #[tokio::test]
    async fn test_store_failure_is_502() {
        let store = MemoryStore {
            broken: true,
            ..MemoryStore::default()
        };
        let (status, json) = send(state(store), &format!(r#"{{"busId": "{BUS}"}}"#)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json, json!({ "error": "GPS log lookup failed" }));
    }

    #[tokio::test]
    async fn test_non_json_content_type_is_400() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header("content-type", "text/plain")
            .body(Body::from(format!(r#"{{"busId": "{BUS}"}}"#)))
            .unwrap();
        let (status, bytes) = call(state(MemoryStore::default()), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["error"].as_str().unwrap().starts_with("invalid JSON body"));
    }

    #[tokio::test]
    async fn test_get_predict_is_405() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/predict")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(state(MemoryStore::default()), req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_health() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = call(state(MemoryStore::default()), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..], b"OK");
    }
}
