//! Info card for a single reading, shown for a clicked marker or a point
//! lookup.

use crate::models::{PointReading, SeverityBand, Station};

impl From<&Station> for PointReading {
    fn from(station: &Station) -> Self {
        PointReading {
            aqi: station.aqi,
            city: station.metadata.name.clone(),
            dominant_pollutant: station.metadata.dominant_pollutant.clone(),
        }
    }
}

/// Render `reading` as a short Markdown card.
///
/// An AQI of 0 is treated like a missing reading.
pub fn info_card(reading: Option<&PointReading>) -> String {
    let reading = reading.and_then(|r| r.aqi.filter(|aqi| *aqi != 0).map(|aqi| (r, aqi)));
    let Some((reading, aqi)) = reading else {
        return "No air quality data available\n".to_string();
    };
    let band = SeverityBand::from_aqi(aqi);

    let mut card = String::new();
    card.push_str("### Air Quality Index\n\n");
    card.push_str(&format!(
        "{} **{}** {} (`{}`)\n\n",
        band.emoji(),
        aqi,
        band.label(),
        band.color()
    ));
    card.push_str(&format!(
        "{}\n",
        reading.city.as_deref().unwrap_or("Unknown location")
    ));
    if let Some(ref pollutant) = reading.dominant_pollutant {
        card.push_str(&format!("\nMain Pollutant: {}\n", pollutant));
    }
    card.push_str("\n_Source: World Air Quality Index Project_\n");

    card
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_card_full_reading() {
        let reading = PointReading {
            aqi: Some(74),
            city: Some("Accra, Ghana".to_string()),
            dominant_pollutant: Some("pm25".to_string()),
        };
        let card = info_card(Some(&reading));

        assert!(card.contains("**74** Moderate (`#FFDE33`)"));
        assert!(card.contains("Accra, Ghana"));
        assert!(card.contains("Main Pollutant: pm25"));
        assert!(card.contains("Source: World Air Quality Index Project"));
    }

    #[test]
    fn test_info_card_fallbacks() {
        let reading = PointReading {
            aqi: Some(320),
            ..Default::default()
        };
        let card = info_card(Some(&reading));
        assert!(card.contains("Hazardous"));
        assert!(card.contains("Unknown location"));
        assert!(!card.contains("Main Pollutant"));
    }

    #[test]
    fn test_info_card_for_station() {
        let station = Station {
            id: crate::models::StationId(5722),
            position: crate::models::Position { lat: 51.5, lng: -0.1 },
            aqi: Some(38),
            metadata: crate::models::StationMetadata {
                name: Some("London".to_string()),
                dominant_pollutant: None,
                updated: None,
            },
            fetched_at: chrono::Utc::now(),
        };

        let card = info_card(Some(&PointReading::from(&station)));
        assert!(card.contains("**38** Good"));
        assert!(card.contains("London"));
    }

    #[test]
    fn test_info_card_without_data() {
        assert_eq!(info_card(None), "No air quality data available\n");
        assert_eq!(
            info_card(Some(&PointReading::default())),
            "No air quality data available\n"
        );
    }

    #[test]
    fn test_info_card_zero_aqi_has_no_data() {
        let reading = PointReading {
            aqi: Some(0),
            city: Some("Reykjavik".to_string()),
            dominant_pollutant: None,
        };
        assert_eq!(info_card(Some(&reading)), "No air quality data available\n");
    }
}
