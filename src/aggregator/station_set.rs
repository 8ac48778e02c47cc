//! Deduplicated station collection and statistics over it.
//!
//! Merges are keyed upserts: the last write for an id wins and nothing is
//! ever removed, so merging is idempotent and, for disjoint ids, order
//! independent.

use crate::models::{Station, StationId, StationSummary};
use std::collections::HashMap;

/// Mapping from station id to station.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationSet {
    stations: HashMap<StationId, Station>,
}

impl StationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    pub fn contains(&self, id: StationId) -> bool {
        self.stations.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Insert or overwrite the entry for `station.id`.
    ///
    /// Returns true if the set changed.
    pub fn upsert(&mut self, station: Station) -> bool {
        match self.stations.get(&station.id) {
            Some(existing) if *existing == station => false,
            _ => {
                self.stations.insert(station.id, station);
                true
            }
        }
    }

    /// Upsert every station, returning how many entries changed.
    pub fn merge<I>(&mut self, stations: I) -> usize
    where
        I: IntoIterator<Item = Station>,
    {
        stations
            .into_iter()
            .map(|s| self.upsert(s))
            .filter(|changed| *changed)
            .count()
    }

    /// Owned copy of every station, for rendering.
    pub fn snapshot(&self) -> Vec<Station> {
        self.stations.values().cloned().collect()
    }

    /// Summary statistics for the whole set.
    pub fn summary(&self) -> StationSummary {
        StationSummary::from_stations(self.stations.values())
    }
}

impl FromIterator<Station> for StationSet {
    fn from_iter<T: IntoIterator<Item = Station>>(iter: T) -> Self {
        let mut set = StationSet::new();
        set.merge(iter);
        set
    }
}

/// Sort stations by AQI (worst first); stations without a reading go last.
pub fn sort_by_severity(stations: &mut [Station]) {
    stations.sort_by(|a, b| b.aqi.cmp(&a.aqi).then_with(|| a.id.cmp(&b.id)));
}

/// Group stations by dominant pollutant.
pub fn group_by_pollutant(stations: &[Station]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for station in stations {
        let key = station
            .metadata
            .dominant_pollutant
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        *counts.entry(key).or_default() += 1;
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Position, StationMetadata};
    use chrono::{TimeZone, Utc};

    fn station(id: i64, aqi: Option<i32>) -> Station {
        Station {
            id: StationId(id),
            position: Position { lat: 10.0, lng: 10.0 },
            aqi,
            metadata: StationMetadata::default(),
            fetched_at: Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_upsert_reports_changes() {
        let mut set = StationSet::new();
        assert!(set.upsert(station(1, Some(10))));
        assert!(!set.upsert(station(1, Some(10))));
        assert!(set.upsert(station(1, Some(20))));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(StationId(1)).and_then(|s| s.aqi), Some(20));
    }

    #[test]
    fn test_merge_never_prunes() {
        let mut set: StationSet = vec![station(1, Some(10)), station(2, Some(20))]
            .into_iter()
            .collect();

        let changed = set.merge(vec![station(3, Some(30))]);
        assert_eq!(changed, 1);
        assert_eq!(set.len(), 3);
        assert!(set.contains(StationId(1)));
    }

    #[test]
    fn test_sort_by_severity() {
        let mut stations = vec![
            station(1, Some(40)),
            station(2, None),
            station(3, Some(250)),
            station(4, Some(120)),
        ];

        sort_by_severity(&mut stations);
        let ids: Vec<i64> = stations.iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_group_by_pollutant() {
        let mut with_pm = station(1, Some(40));
        with_pm.metadata.dominant_pollutant = Some("pm25".to_string());
        let counts = group_by_pollutant(&[with_pm, station(2, Some(10))]);

        assert_eq!(counts.get("pm25"), Some(&1));
        assert_eq!(counts.get("unknown"), Some(&1));
    }
}
