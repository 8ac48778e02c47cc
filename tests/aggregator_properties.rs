//! Behavioural tests for the station aggregator, driven through fake
//! providers.

use aqmap::aggregator::{AggregatorSettings, Region, StationAggregator, StationSet, ViewportRefresh};
use aqmap::models::{BoundingBox, PointReading, Position, SeverityBand, Station, StationId, StationMetadata};
use aqmap::provider::{ProviderError, StationProvider, StationRecord};
use aqmap::viewport::MapViewport;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

fn station(id: i64, aqi: i32) -> Station {
    Station {
        id: StationId(id),
        position: Position {
            lat: id as f64 % 80.0,
            lng: id as f64 % 170.0,
        },
        aqi: Some(aqi),
        metadata: StationMetadata::default(),
        fetched_at: Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap(),
    }
}

fn region(name: &str, north: f64) -> Region {
    Region {
        name: name.to_string(),
        bounds: BoundingBox::new(north, north - 5.0, 10.0, 0.0).unwrap(),
    }
}

fn settings(regions: Vec<Region>) -> AggregatorSettings {
    AggregatorSettings {
        regions,
        ..AggregatorSettings::default()
    }
}

/// Returns one station per query, id derived from the box's north edge.
/// Fails for any box whose north edge is listed in `failing`.
#[derive(Default)]
struct RegionProvider {
    failing: Vec<f64>,
    calls: AtomicUsize,
}

#[async_trait]
impl StationProvider for RegionProvider {
    async fn stations_in(&self, bbox: &BoundingBox) -> Result<Vec<StationRecord>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&bbox.north) {
            return Err(ProviderError::NotOk("error: over quota".to_string()));
        }
        Ok(vec![StationRecord::new(
            bbox.north as i64,
            bbox.south,
            bbox.west,
            Some(42),
        )])
    }

    async fn point_reading(&self, _lat: f64, _lng: f64) -> Result<PointReading, ProviderError> {
        Err(ProviderError::MissingToken)
    }
}

/// Blocks every query until the test releases the gate.
struct GatedProvider {
    gate: Semaphore,
    started: AtomicUsize,
}

impl GatedProvider {
    fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
        }
    }

    fn release(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

#[async_trait]
impl StationProvider for GatedProvider {
    async fn stations_in(&self, bbox: &BoundingBox) -> Result<Vec<StationRecord>, ProviderError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let _permit = self.gate.acquire().await;
        Ok(vec![StationRecord::new(
            self.started.load(Ordering::SeqCst) as i64,
            bbox.south,
            bbox.west,
            Some(99),
        )])
    }

    async fn point_reading(&self, _lat: f64, _lng: f64) -> Result<PointReading, ProviderError> {
        Ok(PointReading::default())
    }
}

#[test]
fn merge_is_idempotent() {
    let batch = vec![station(1, 10), station(2, 20), station(3, 30)];

    let mut once = StationSet::new();
    once.merge(batch.clone());
    let mut twice = once.clone();
    let changed = twice.merge(batch);

    assert_eq!(changed, 0);
    assert_eq!(once, twice);
}

#[test]
fn merge_order_does_not_matter_for_disjoint_ids() {
    let a = vec![station(1, 10), station(2, 20)];
    let b = vec![station(3, 30), station(4, 40)];

    let mut ab = StationSet::new();
    ab.merge(a.clone());
    ab.merge(b.clone());

    let mut ba = StationSet::new();
    ba.merge(b);
    ba.merge(a);

    assert_eq!(ab, ba);
    assert_eq!(ab.len(), 4);
}

#[test]
fn last_write_wins_on_overlap() {
    let mut set = StationSet::new();
    set.merge(vec![station(7, 10), station(8, 80)]);
    set.merge(vec![station(7, 155)]);

    assert_eq!(set.len(), 2);
    assert_eq!(set.get(StationId(7)).and_then(|s| s.aqi), Some(155));
    assert_eq!(set.iter().filter(|s| s.id == StationId(7)).count(), 1);
}

#[test]
fn severity_is_total_and_monotonic() {
    let samples = [-1, 0, 50, 51, 100, 101, 150, 151, 200, 201, 300, 301, 10000];
    let expected = [
        SeverityBand::Good,
        SeverityBand::Good,
        SeverityBand::Good,
        SeverityBand::Moderate,
        SeverityBand::Moderate,
        SeverityBand::UnhealthyForSensitiveGroups,
        SeverityBand::UnhealthyForSensitiveGroups,
        SeverityBand::Unhealthy,
        SeverityBand::Unhealthy,
        SeverityBand::VeryUnhealthy,
        SeverityBand::VeryUnhealthy,
        SeverityBand::Hazardous,
        SeverityBand::Hazardous,
    ];

    let bands: Vec<SeverityBand> = samples.iter().map(|aqi| SeverityBand::from_aqi(*aqi)).collect();
    assert_eq!(bands, expected);
    assert!(bands.windows(2).all(|pair| pair[0] <= pair[1]));

    for aqi in samples {
        let band = SeverityBand::from_aqi(aqi);
        assert_eq!(aqmap::models::severity_color(aqi), band.color());
        assert_eq!(aqmap::models::severity_label(aqi), band.label());
    }
}

#[tokio::test]
async fn failing_region_leaves_the_others() {
    let provider = Arc::new(RegionProvider {
        failing: vec![30.0],
        ..RegionProvider::default()
    });
    let regions = vec![
        region("one", 10.0),
        region("two", 20.0),
        region("three", 30.0),
        region("four", 40.0),
    ];
    let agg = StationAggregator::new(provider.clone(), settings(regions));

    let swept = agg.sweep_world().await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    assert_eq!(swept.len(), 3);
    for id in [10, 20, 40] {
        assert!(swept.contains(StationId(id)), "missing station {id}");
    }
    assert!(!swept.contains(StationId(30)));
    assert_eq!(agg.current_stations().await.len(), 3);
}

#[tokio::test]
async fn viewport_refresh_respects_epsilon() {
    let provider = Arc::new(RegionProvider::default());
    let agg = StationAggregator::new(provider.clone(), AggregatorSettings::default());

    let base = BoundingBox::new(50.0, 40.0, 10.0, 0.0).unwrap();
    assert_eq!(agg.refresh_viewport(base).await, ViewportRefresh::Refreshed(1));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    let nudged = BoundingBox::new(50.005, 40.005, 10.005, 0.005).unwrap();
    assert_eq!(agg.refresh_viewport(nudged).await, ViewportRefresh::Skipped);

    let at_epsilon = BoundingBox::new(50.0, 40.0, 10.0, 0.01).unwrap();
    assert_eq!(agg.refresh_viewport(at_epsilon).await, ViewportRefresh::Skipped);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    let moved = BoundingBox::new(50.02, 40.0, 10.0, 0.0).unwrap();
    assert_eq!(agg.refresh_viewport(moved).await, ViewportRefresh::Refreshed(1));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn late_results_after_unmount_change_nothing() {
    let provider = Arc::new(GatedProvider::new());
    let agg = StationAggregator::new(provider.clone(), settings(vec![region("only", 10.0)]));
    let viewport = Arc::new(MapViewport::new());

    let mounted = agg.mount(viewport.clone());

    // A refresh that is not owned by the mounted task and outlives it.
    let detached = {
        let agg = agg.clone();
        tokio::spawn(async move {
            agg.refresh_viewport(BoundingBox::new(60.0, 50.0, 30.0, 20.0).unwrap())
                .await
        })
    };

    while provider.started.load(Ordering::SeqCst) < 2 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let updates = agg.updates();
    mounted.unmount().await;
    assert_eq!(viewport.listener_count(), 0);

    provider.release();
    let outcome = detached.await.unwrap();

    assert_eq!(outcome, ViewportRefresh::Refreshed(1));
    assert!(agg.current_stations().await.is_empty());
    assert_eq!(*updates.borrow(), 0);
}
