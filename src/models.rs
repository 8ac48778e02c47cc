//! Data models for the station aggregator.
//!
//! This module contains the core data structures used throughout the
//! crate: stations and their positions, bounding boxes, severity bands and
//! the summary statistics rendered alongside map overlays.

use crate::error::AqmapError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Opaque station identifier (the provider's `uid`), stable across refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub i64);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    /// Builds a position, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let position = Self { lat, lng };
        position.is_valid().then_some(position)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Provider-supplied fields that are only ever displayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationMetadata {
    /// Station name as reported by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Dominant pollutant code (e.g. `pm25`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_pollutant: Option<String>,
    /// Provider's last-update timestamp, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

/// A fixed air-quality monitoring point and its latest reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub position: Position,
    /// Latest AQI, absent when the provider has no reading yet.
    pub aqi: Option<i32>,
    pub metadata: StationMetadata,
    /// When this entry was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl Station {
    /// Severity band of the current reading, if any.
    pub fn band(&self) -> Option<SeverityBand> {
        self.aqi.map(SeverityBand::from_aqi)
    }

    /// Display name, falling back to a placeholder.
    pub fn display_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("Unknown location")
    }
}

/// Rectangular region in degrees.
///
/// `east`/`west` are not normalized and may wrap the antimeridian
/// (`west > east`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Create a validated bounding box.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, AqmapError> {
        let bbox = Self {
            north,
            south,
            east,
            west,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check the `south <= north` invariant and coordinate ranges.
    pub fn validate(&self) -> Result<(), AqmapError> {
        let edges = [self.north, self.south, self.east, self.west];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(AqmapError::validation(format!(
                "bounding box has non-finite edge: {self}"
            )));
        }
        if !(-90.0..=90.0).contains(&self.north) || !(-90.0..=90.0).contains(&self.south) {
            return Err(AqmapError::validation(format!(
                "latitude out of range in bounding box: {self}"
            )));
        }
        if self.south > self.north {
            return Err(AqmapError::validation(format!(
                "south ({}) must not exceed north ({})",
                self.south, self.north
            )));
        }
        Ok(())
    }

    /// The provider's `latlng` query value: `south,west,north,east`.
    pub fn to_query(&self) -> String {
        format!("{},{},{},{}", self.south, self.west, self.north, self.east)
    }

    /// True if any edge moved by more than `epsilon` degrees.
    pub fn differs_from(&self, other: &BoundingBox, epsilon: f64) -> bool {
        (self.north - other.north).abs() > epsilon
            || (self.south - other.south).abs() > epsilon
            || (self.east - other.east).abs() > epsilon
            || (self.west - other.west).abs() > epsilon
    }

    /// Whether `position` falls inside the box, honouring antimeridian wrap.
    pub fn contains(&self, position: &Position) -> bool {
        if position.lat < self.south || position.lat > self.north {
            return false;
        }
        if self.west <= self.east {
            position.lng >= self.west && position.lng <= self.east
        } else {
            position.lng >= self.west || position.lng <= self.east
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[S {:.3}, W {:.3}, N {:.3}, E {:.3}]",
            self.south, self.west, self.north, self.east
        )
    }
}

/// Parses `south,west,north,east`, the same order the provider uses.
impl FromStr for BoundingBox {
    type Err = AqmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| AqmapError::validation(format!("invalid bounding box '{s}': {e}")))?;

        match parts.as_slice() {
            [south, west, north, east] => BoundingBox::new(*north, *south, *east, *west),
            _ => Err(AqmapError::validation(format!(
                "bounding box must be 'south,west,north,east', got '{s}'"
            ))),
        }
    }
}

/// AQI severity band.
///
/// Variants are declared in increasing severity so the derived ordering
/// matches the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    /// 0-50
    Good,
    /// 51-100
    Moderate,
    /// 101-150
    UnhealthyForSensitiveGroups,
    /// 151-200
    Unhealthy,
    /// 201-300
    VeryUnhealthy,
    /// Above 300
    Hazardous,
}

impl SeverityBand {
    pub const ALL: [SeverityBand; 6] = [
        SeverityBand::Good,
        SeverityBand::Moderate,
        SeverityBand::UnhealthyForSensitiveGroups,
        SeverityBand::Unhealthy,
        SeverityBand::VeryUnhealthy,
        SeverityBand::Hazardous,
    ];

    /// Classify an AQI value. Negative readings count as Good.
    pub fn from_aqi(aqi: i32) -> Self {
        match aqi {
            i32::MIN..=50 => SeverityBand::Good,
            51..=100 => SeverityBand::Moderate,
            101..=150 => SeverityBand::UnhealthyForSensitiveGroups,
            151..=200 => SeverityBand::Unhealthy,
            201..=300 => SeverityBand::VeryUnhealthy,
            _ => SeverityBand::Hazardous,
        }
    }

    /// Display color (hex).
    pub fn color(&self) -> &'static str {
        match self {
            SeverityBand::Good => "#009966",
            SeverityBand::Moderate => "#FFDE33",
            SeverityBand::UnhealthyForSensitiveGroups => "#FF9933",
            SeverityBand::Unhealthy => "#CC0033",
            SeverityBand::VeryUnhealthy => "#660099",
            SeverityBand::Hazardous => "#7E0023",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            SeverityBand::Good => "Good",
            SeverityBand::Moderate => "Moderate",
            SeverityBand::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            SeverityBand::Unhealthy => "Unhealthy",
            SeverityBand::VeryUnhealthy => "Very Unhealthy",
            SeverityBand::Hazardous => "Hazardous",
        }
    }

    /// Returns an emoji representation of the band.
    pub fn emoji(&self) -> &'static str {
        match self {
            SeverityBand::Good => "🟢",
            SeverityBand::Moderate => "🟡",
            SeverityBand::UnhealthyForSensitiveGroups => "🟠",
            SeverityBand::Unhealthy => "🔴",
            SeverityBand::VeryUnhealthy => "🟣",
            SeverityBand::Hazardous => "🟤",
        }
    }
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Marker color for an AQI value.
pub fn severity_color(aqi: i32) -> &'static str {
    SeverityBand::from_aqi(aqi).color()
}

/// Marker label for an AQI value.
pub fn severity_label(aqi: i32) -> &'static str {
    SeverityBand::from_aqi(aqi).label()
}

/// Result of a single-location lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointReading {
    pub aqi: Option<i32>,
    pub city: Option<String>,
    pub dominant_pollutant: Option<String>,
}

/// Counts of stations per severity band.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    /// Total number of stations.
    pub total: usize,
    /// Stations without an AQI reading.
    pub without_reading: usize,
    /// Highest AQI seen.
    pub max_aqi: Option<i32>,
    /// Stations grouped by band.
    pub by_band: BTreeMap<SeverityBand, usize>,
}

impl StationSummary {
    /// Creates a summary from a list of stations.
    pub fn from_stations<'a, I>(stations: I) -> Self
    where
        I: IntoIterator<Item = &'a Station>,
    {
        let mut summary = Self::default();

        for station in stations {
            summary.total += 1;
            match station.aqi {
                Some(aqi) => {
                    *summary
                        .by_band
                        .entry(SeverityBand::from_aqi(aqi))
                        .or_insert(0) += 1;
                    summary.max_aqi = Some(summary.max_aqi.map_or(aqi, |m| m.max(aqi)));
                }
                None => summary.without_reading += 1,
            }
        }

        summary
    }

    /// Number of stations in `band`.
    pub fn count(&self, band: SeverityBand) -> usize {
        self.by_band.get(&band).copied().unwrap_or(0)
    }

    /// Number of stations at or above `band`.
    pub fn at_or_above(&self, band: SeverityBand) -> usize {
        self.by_band
            .range(band..)
            .map(|(_, count)| *count)
            .sum()
    }
}
