//! Rendering of station sets for map overlays and reports.
//!
//! Markers carry exactly what an overlay needs (position, AQI, band color
//! and label); snapshots bundle them with summary statistics for the
//! Markdown and JSON writers.

pub mod card;
pub mod markdown;

pub use card::info_card;
pub use markdown::snapshot_markdown;

use crate::aggregator::{group_by_pollutant, sort_by_severity, Region};
use crate::cli::OutputFormat;
use crate::models::{Position, SeverityBand, Station, StationId, StationMetadata, StationSummary};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// One map overlay marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayMarker {
    pub id: StationId,
    pub position: Position,
    pub aqi: i32,
    pub band: SeverityBand,
    /// Fill color (hex).
    pub color: String,
    /// Band description shown next to the value.
    pub label: String,
    pub metadata: StationMetadata,
}

impl OverlayMarker {
    /// Marker for `station`, or `None` when it has no reading or an unusable
    /// position.
    pub fn from_station(station: &Station) -> Option<Self> {
        let aqi = station.aqi?;
        if !station.position.is_valid() {
            return None;
        }
        let band = SeverityBand::from_aqi(aqi);

        Some(Self {
            id: station.id,
            position: station.position,
            aqi,
            band,
            color: band.color().to_string(),
            label: band.label().to_string(),
            metadata: station.metadata.clone(),
        })
    }
}

/// Build overlay markers, worst reading first.
pub fn markers(stations: &[Station]) -> Vec<OverlayMarker> {
    let mut sorted = stations.to_vec();
    sort_by_severity(&mut sorted);
    sorted.iter().filter_map(OverlayMarker::from_station).collect()
}

/// Everything a report writer needs, captured at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlaySnapshot {
    pub generated_at: DateTime<Utc>,
    /// Names of the swept regions.
    pub regions: Vec<String>,
    pub total_stations: usize,
    pub summary: StationSummary,
    /// Station count per dominant pollutant.
    pub pollutants: BTreeMap<String, usize>,
    pub markers: Vec<OverlayMarker>,
    /// How many of the worst stations the Markdown report lists.
    #[serde(skip)]
    pub top_stations: usize,
}

impl OverlaySnapshot {
    /// Capture `stations` as a snapshot.
    pub fn new(stations: &[Station], regions: &[Region], top_stations: usize) -> Self {
        Self {
            generated_at: Utc::now(),
            regions: regions.iter().map(|r| r.name.clone()).collect(),
            total_stations: stations.len(),
            summary: StationSummary::from_stations(stations),
            pollutants: group_by_pollutant(stations).into_iter().collect(),
            markers: markers(stations),
            top_stations,
        }
    }
}

/// Pretty JSON for a snapshot.
pub fn snapshot_json(snapshot: &OverlaySnapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).map_err(Into::into)
}

/// Render `snapshot` in `format` and write it to `path`.
pub fn write_snapshot(snapshot: &OverlaySnapshot, format: OutputFormat, path: &Path) -> Result<()> {
    let content = match format {
        OutputFormat::Markdown => snapshot_markdown(snapshot),
        OutputFormat::Json => snapshot_json(snapshot)?,
    };

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: i64, aqi: Option<i32>) -> Station {
        Station {
            id: StationId(id),
            position: Position {
                lat: 51.5,
                lng: -0.12,
            },
            aqi,
            metadata: StationMetadata {
                name: Some(format!("Station {id}")),
                ..Default::default()
            },
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_markers_skip_stations_without_reading() {
        let stations = vec![station(1, Some(42)), station(2, None), station(3, Some(180))];
        let markers = markers(&stations);

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].id, StationId(3));
        assert_eq!(markers[0].color, "#CC0033");
        assert_eq!(markers[0].label, "Unhealthy");
        assert_eq!(markers[1].color, "#009966");
    }

    #[test]
    fn test_marker_rejects_invalid_position() {
        let mut broken = station(1, Some(42));
        broken.position.lat = f64::NAN;
        assert!(OverlayMarker::from_station(&broken).is_none());
    }

    #[test]
    fn test_snapshot_json() {
        let snapshot = OverlaySnapshot::new(
            &[station(1, Some(42)), station(2, None)],
            &crate::aggregator::default_regions(),
            5,
        );
        let json = snapshot_json(&snapshot).unwrap();

        assert!(json.contains("\"total_stations\": 2"));
        assert!(json.contains("\"markers\""));
        assert!(json.contains("\"color\": \"#009966\""));
        assert!(json.contains("Europe"));
        assert!(!json.contains("top_stations"));
    }

    #[test]
    fn test_write_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stations.md");
        let snapshot = OverlaySnapshot::new(&[station(1, Some(42))], &[], 5);

        write_snapshot(&snapshot, OutputFormat::Markdown, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Air Quality Stations"));
    }
}
