//! Geospatial air-quality providers.
//!
//! The aggregator only sees the [`StationProvider`] trait; [`WaqiClient`] is
//! the production implementation backed by the World Air Quality Index API.

pub mod error;
pub mod waqi;
pub mod wire;

pub use error::ProviderError;
pub use waqi::WaqiClient;
pub use wire::StationRecord;

use crate::models::{BoundingBox, PointReading};
use async_trait::async_trait;

/// A source of station data that can be queried by bounding box or point.
#[async_trait]
pub trait StationProvider: Send + Sync {
    /// All stations inside `bbox`, as raw records.
    async fn stations_in(&self, bbox: &BoundingBox) -> Result<Vec<StationRecord>, ProviderError>;

    /// Reading for the station nearest to a single location.
    async fn point_reading(&self, lat: f64, lng: f64) -> Result<PointReading, ProviderError>;
}
