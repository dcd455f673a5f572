use std::future::Future;

use eta_model::GpsSample;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime},
    options::FindOneOptions,
    Client, Collection,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid bus identifier {0:?}")]
    InvalidBusId(String),

    #[error("document store query failed: {0}")]
    Backend(#[from] mongodb::error::Error),

    #[error("malformed GPS log: {0}")]
    Malformed(String),
}

/// Source of the most recent GPS fix per bus.
pub trait GpsLogStore: Send + Sync + 'static {
    fn latest_for_bus(
        &self,
        bus_id: &str,
    ) -> impl Future<Output = Result<Option<GpsSample>, StoreError>> + Send;
}

#[derive(Debug, Deserialize)]
struct GeoPoint {
    /// GeoJSON order: [longitude, latitude]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct GpsLogDocument {
    #[serde(rename = "busId")]
    bus_id: ObjectId,
    location: GeoPoint,
    #[serde(default)]
    speed: Option<f64>,
    timestamp: DateTime,
}

impl GpsLogDocument {
    fn into_sample(self) -> Result<GpsSample, StoreError> {
        let [longitude, latitude] = self.location.coordinates[..] else {
            return Err(StoreError::Malformed(format!(
                "expected [longitude, latitude], got {} coordinates",
                self.location.coordinates.len()
            )));
        };
        Ok(GpsSample {
            bus_id: self.bus_id.to_hex(),
            latitude,
            longitude,
            speed: self.speed,
            // stored as UTC; the hour/weekday features are UTC too
            timestamp: self.timestamp.to_chrono().naive_utc(),
        })
    }
}

/// `gpslogs` collection, keyed by `busId` ObjectId.
pub struct MongoGpsLogStore {
    collection: Collection<GpsLogDocument>,
}

impl MongoGpsLogStore {
    pub async fn connect(uri: &str, db: &str, collection: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self {
            collection: client.database(db).collection(collection),
        })
    }
}

impl GpsLogStore for MongoGpsLogStore {
    async fn latest_for_bus(&self, bus_id: &str) -> Result<Option<GpsSample>, StoreError> {
        let oid = ObjectId::parse_str(bus_id)
            .map_err(|_| StoreError::InvalidBusId(bus_id.to_string()))?;
        let options = FindOneOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .build();

        self.collection
            .find_one(doc! { "busId": oid }, options)
            .await?
            .map(GpsLogDocument::into_sample)
            .transpose()
    }
}
