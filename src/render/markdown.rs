//! Markdown snapshot report.

use super::{OverlayMarker, OverlaySnapshot};
use crate::models::{SeverityBand, StationSummary};
use std::collections::BTreeMap;

/// Generate a complete Markdown report.
pub fn snapshot_markdown(snapshot: &OverlaySnapshot) -> String {
    let mut output = String::new();

    output.push_str("# Air Quality Stations\n\n");
    output.push_str(&generate_metadata_section(snapshot));
    output.push_str(&generate_summary_section(&snapshot.summary));
    output.push_str(&generate_pollutant_section(&snapshot.pollutants));
    output.push_str(&generate_top_section(
        &snapshot.markers,
        snapshot.top_stations,
    ));
    output.push_str(&generate_station_table(&snapshot.markers));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(snapshot: &OverlaySnapshot) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        snapshot.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if !snapshot.regions.is_empty() {
        section.push_str(&format!("- **Regions:** {}\n", snapshot.regions.join(", ")));
    }
    section.push_str(&format!("- **Stations:** {}\n", snapshot.total_stations));
    if snapshot.summary.without_reading > 0 {
        section.push_str(&format!(
            "- **Without Reading:** {}\n",
            snapshot.summary.without_reading
        ));
    }
    if let Some(max) = snapshot.summary.max_aqi {
        section.push_str(&format!(
            "- **Highest AQI:** {} ({})\n",
            max,
            SeverityBand::from_aqi(max)
        ));
    }
    section.push('\n');

    section
}

fn generate_summary_section(summary: &StationSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Band | AQI | Stations |\n");
    section.push_str("|:---|:---:|:---:|\n");

    for band in SeverityBand::ALL {
        section.push_str(&format!(
            "| {} {} | {} | {} |\n",
            band.emoji(),
            band.label(),
            aqi_range(band),
            summary.count(band)
        ));
    }
    section.push_str(&format!(
        "| **Total** | | **{}** |\n\n",
        summary.total - summary.without_reading
    ));

    section
}

fn generate_pollutant_section(pollutants: &BTreeMap<String, usize>) -> String {
    if pollutants.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("### Dominant Pollutants\n\n");
    section.push_str("| Pollutant | Stations |\n");
    section.push_str("|:---|:---:|\n");

    let mut counts: Vec<_> = pollutants.iter().collect();
    counts.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

    for (pollutant, count) in counts {
        section.push_str(&format!("| {} | {} |\n", pollutant, count));
    }
    section.push('\n');

    section
}

fn aqi_range(band: SeverityBand) -> &'static str {
    match band {
        SeverityBand::Good => "0-50",
        SeverityBand::Moderate => "51-100",
        SeverityBand::UnhealthyForSensitiveGroups => "101-150",
        SeverityBand::Unhealthy => "151-200",
        SeverityBand::VeryUnhealthy => "201-300",
        SeverityBand::Hazardous => "300+",
    }
}

fn generate_top_section(markers: &[OverlayMarker], limit: usize) -> String {
    if markers.is_empty() || limit == 0 {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Worst Stations\n\n");
    for (rank, marker) in markers.iter().take(limit).enumerate() {
        section.push_str(&format!(
            "{}. {} **{}** - AQI {} ({})\n",
            rank + 1,
            marker.band.emoji(),
            station_name(marker),
            marker.aqi,
            marker.label
        ));
    }
    section.push('\n');

    section
}

fn generate_station_table(markers: &[OverlayMarker]) -> String {
    let mut section = String::new();

    section.push_str("## All Stations\n\n");

    if markers.is_empty() {
        section.push_str("No stations with a reading yet.\n\n");
        return section;
    }

    section.push_str("| Station | AQI | Band | Pollutant | Position |\n");
    section.push_str("|:---|:---:|:---|:---:|:---|\n");

    for marker in markers {
        section.push_str(&format!(
            "| {} | {} | {} {} | {} | {:.4}, {:.4} |\n",
            station_name(marker).replace('|', "/"),
            marker.aqi,
            marker.band.emoji(),
            marker.label,
            marker.metadata.dominant_pollutant.as_deref().unwrap_or("-"),
            marker.position.lat,
            marker.position.lng
        ));
    }
    section.push('\n');

    section
}

fn station_name(marker: &OverlayMarker) -> &str {
    marker
        .metadata
        .name
        .as_deref()
        .unwrap_or("Unknown location")
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Source: World Air Quality Index Project (waqi.info)*\n");

    footer
}
