//! HTTP client for the World Air Quality Index (WAQI) API.

use super::wire::{Envelope, FeedData, StationRecord};
use super::{ProviderError, StationProvider};
use crate::config::ProviderConfig;
use crate::models::{BoundingBox, PointReading};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// WAQI API client.
///
/// The token comes strictly from configuration. Without one every call fails
/// with [`ProviderError::MissingToken`] before touching the network.
pub struct WaqiClient {
    http_client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl WaqiClient {
    /// Create a client from provider settings.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("aqmap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config
                .token
                .as_ref()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        })
    }

    /// Whether a token is configured.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn token(&self) -> Result<&str, ProviderError> {
        self.token.as_deref().ok_or(ProviderError::MissingToken)
    }

    fn bounds_url(&self, bbox: &BoundingBox, token: &str) -> String {
        format!(
            "{}/map/bounds/?latlng={}&token={}",
            self.base_url,
            bbox.to_query(),
            token
        )
    }

    fn feed_url(&self, lat: f64, lng: f64, token: &str) -> String {
        format!("{}/feed/geo:{};{}/?token={}", self.base_url, lat, lng, token)
    }

    /// GET a URL and return the body, mapping transport and HTTP failures.
    async fn get_body(&self, url: &str) -> Result<String, ProviderError> {
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status(status, body));
        }

        Ok(response.text().await?)
    }
}

/// Decode a `map/bounds` body. Only `status == "ok"` is accepted.
///
/// Entries that do not decode as a station record are skipped one by one.
pub fn decode_bounds(body: &str) -> Result<Vec<StationRecord>, ProviderError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if !envelope.is_ok() {
        return Err(ProviderError::NotOk(envelope.reason()));
    }
    if envelope.data.is_null() {
        return Ok(Vec::new());
    }

    let entries: Vec<Value> = serde_json::from_value(envelope.data)?;
    let records = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<StationRecord>(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Skipping undecodable station record: {}", e);
                None
            }
        })
        .collect();

    Ok(records)
}

/// Decode a `feed/geo:` body. Only `status == "ok"` is accepted.
pub fn decode_feed(body: &str) -> Result<PointReading, ProviderError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if !envelope.is_ok() {
        return Err(ProviderError::NotOk(envelope.reason()));
    }
    let data: FeedData = serde_json::from_value(envelope.data)?;
    Ok(data.into())
}

#[async_trait]
impl StationProvider for WaqiClient {
    async fn stations_in(&self, bbox: &BoundingBox) -> Result<Vec<StationRecord>, ProviderError> {
        let token = self.token()?;
        debug!("Querying WAQI bounds {}", bbox);

        let body = self.get_body(&self.bounds_url(bbox, token)).await?;
        let records = decode_bounds(&body)?;

        debug!("WAQI returned {} records for {}", records.len(), bbox);
        Ok(records)
    }

    async fn point_reading(&self, lat: f64, lng: f64) -> Result<PointReading, ProviderError> {
        let token = self.token()?;
        debug!("Querying WAQI feed at ({}, {})", lat, lng);

        let body = self.get_body(&self.feed_url(lat, lng, token)).await?;
        decode_feed(&body)
    }
}
