//! WAQI response structures and conversion into internal models.

use crate::models::{PointReading, Position, Station, StationId, StationMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every WAQI response: `{status, data}`. On failure `data` holds a message.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub status: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Human-readable reason for a non-ok response.
    pub fn reason(&self) -> String {
        match &self.data {
            Value::String(message) => format!("{}: {}", self.status, message),
            _ => self.status.clone(),
        }
    }
}

/// One entry of a `map/bounds` response.
///
/// Missing or null fields decode as `None`; [`StationRecord::into_station`]
/// decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    #[serde(default)]
    pub uid: Option<i64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Either a number or a string such as `"57"` or `"-"`.
    #[serde(default)]
    pub aqi: Value,
    #[serde(default)]
    pub station: Option<StationInfo>,
    #[serde(default)]
    pub dominentpol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

impl StationRecord {
    /// Convenience constructor used by fakes and fixtures.
    pub fn new(uid: i64, lat: f64, lon: f64, aqi: Option<i32>) -> Self {
        Self {
            uid: Some(uid),
            lat: Some(lat),
            lon: Some(lon),
            aqi: aqi.map(Value::from).unwrap_or(Value::Null),
            station: None,
            dominentpol: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.station = Some(StationInfo {
            name: Some(name.to_string()),
            time: None,
        });
        self
    }

    /// Convert to a [`Station`], or `None` when the id or coordinates are
    /// missing or malformed.
    pub fn into_station(self, fetched_at: DateTime<Utc>) -> Option<Station> {
        let id = StationId(self.uid?);
        let position = Position::new(self.lat?, self.lon?)?;
        let aqi = parse_aqi(&self.aqi);
        let (name, updated) = match self.station {
            Some(info) => (info.name, info.time),
            None => (None, None),
        };

        Some(Station {
            id,
            position,
            aqi,
            metadata: StationMetadata {
                name,
                dominant_pollutant: self.dominentpol,
                updated,
            },
            fetched_at,
        })
    }
}

/// `data` of a `feed/geo:` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedData {
    #[serde(default)]
    pub aqi: Value,
    #[serde(default)]
    pub city: Option<FeedCity>,
    #[serde(default)]
    pub dominentpol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedCity {
    #[serde(default)]
    pub name: Option<String>,
}

impl From<FeedData> for PointReading {
    fn from(data: FeedData) -> Self {
        PointReading {
            aqi: parse_aqi(&data.aqi),
            city: data.city.and_then(|c| c.name),
            dominant_pollutant: data.dominentpol.filter(|p| !p.is_empty()),
        }
    }
}

/// Parse WAQI's loosely typed AQI field.
pub fn parse_aqi(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
            .and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i32))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_aqi_variants() {
        assert_eq!(parse_aqi(&json!(57)), Some(57));
        assert_eq!(parse_aqi(&json!("57")), Some(57));
        assert_eq!(parse_aqi(&json!(" 102 ")), Some(102));
        assert_eq!(parse_aqi(&json!(41.6)), Some(42));
        assert_eq!(parse_aqi(&json!("-")), None);
        assert_eq!(parse_aqi(&Value::Null), None);
    }

    #[test]
    fn test_record_conversion() {
        let record: StationRecord = serde_json::from_value(json!({
            "uid": 8397,
            "lat": 48.85,
            "lon": 2.35,
            "aqi": "63",
            "station": {"name": "Paris", "time": "2026-10-15T10:00:00+02:00"},
            "dominentpol": "pm25"
        }))
        .unwrap();

        let station = record.into_station(Utc::now()).unwrap();
        assert_eq!(station.id, StationId(8397));
        assert_eq!(station.aqi, Some(63));
        assert_eq!(station.metadata.name.as_deref(), Some("Paris"));
        assert_eq!(station.metadata.dominant_pollutant.as_deref(), Some("pm25"));
    }

    #[test]
    fn test_record_without_coordinates_is_skipped() {
        let record: StationRecord =
            serde_json::from_value(json!({"uid": 1, "lat": null, "lon": 3.0, "aqi": "10"}))
                .unwrap();
        assert!(record.into_station(Utc::now()).is_none());

        let out_of_range = StationRecord::new(2, 120.0, 3.0, Some(10));
        assert!(out_of_range.into_station(Utc::now()).is_none());

        let no_uid = StationRecord {
            uid: None,
            ..StationRecord::new(3, 1.0, 1.0, Some(10))
        };
        assert!(no_uid.into_station(Utc::now()).is_none());
    }

    #[test]
    fn test_envelope_reason() {
        let env: Envelope =
            serde_json::from_value(json!({"status": "error", "data": "Invalid key"})).unwrap();
        assert!(!env.is_ok());
        assert_eq!(env.reason(), "error: Invalid key");
    }

    #[test]
    fn test_feed_conversion() {
        let data: FeedData = serde_json::from_value(json!({
            "aqi": 88,
            "city": {"name": "Nairobi"},
            "dominentpol": ""
        }))
        .unwrap();
        let reading = PointReading::from(data);
        assert_eq!(reading.aqi, Some(88));
        assert_eq!(reading.city.as_deref(), Some("Nairobi"));
        assert_eq!(reading.dominant_pollutant, None);
    }
}
