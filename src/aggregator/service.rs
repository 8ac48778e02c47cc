//! The station aggregator: region fetches, world sweeps and viewport
//! refreshes all merging into one shared station set.

use super::regions::{default_regions, Region};
use super::station_set::StationSet;
use crate::config::{AggregatorConfig, MAX_SWEEP_INTERVAL_MINUTES};
use crate::models::{BoundingBox, Station, StationSummary};
use crate::provider::{ProviderError, StationProvider};
use crate::viewport::{ViewportFilter, ViewportHost};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

/// Tunables for one aggregator instance.
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    /// Macro-regions covered by each world sweep.
    pub regions: Vec<Region>,
    /// Period between world sweeps while mounted.
    pub sweep_interval: Duration,
    /// Minimum edge movement (degrees) before a viewport refresh is issued.
    pub viewport_epsilon: f64,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            sweep_interval: Duration::from_secs(15 * 60),
            viewport_epsilon: 0.01,
        }
    }
}

impl From<&AggregatorConfig> for AggregatorSettings {
    fn from(config: &AggregatorConfig) -> Self {
        Self {
            regions: config.regions.clone(),
            sweep_interval: sweep_interval(config.sweep_interval_minutes),
            viewport_epsilon: config.viewport_epsilon,
        }
    }
}

/// Sweep period for `minutes`, clamped to `1..=MAX_SWEEP_INTERVAL_MINUTES`.
fn sweep_interval(minutes: u64) -> Duration {
    let minutes = minutes.clamp(1, MAX_SWEEP_INTERVAL_MINUTES);
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Outcome of a viewport refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportRefresh {
    /// A fetch was issued and this many stations came back.
    Refreshed(usize),
    /// The box did not move enough since the last refresh.
    Skipped,
    /// The provider failed; the box was not recorded as refreshed.
    Failed,
    /// The viewport host has no bounds yet.
    Unavailable,
}

struct Shared {
    stations: RwLock<StationSet>,
    live: AtomicBool,
    revision: watch::Sender<u64>,
}

/// Keeps a deduplicated, periodically refreshed set of stations.
///
/// Cloning is cheap and every clone shares the same set.
#[derive(Clone)]
pub struct StationAggregator {
    provider: Arc<dyn StationProvider>,
    settings: Arc<AggregatorSettings>,
    shared: Arc<Shared>,
    filter: Arc<Mutex<ViewportFilter>>,
}

impl StationAggregator {
    /// Create an aggregator with an empty station set.
    pub fn new(provider: Arc<dyn StationProvider>, settings: AggregatorSettings) -> Self {
        let (revision, _) = watch::channel(0);
        let filter = ViewportFilter::new(settings.viewport_epsilon);

        Self {
            provider,
            settings: Arc::new(settings),
            shared: Arc::new(Shared {
                stations: RwLock::new(StationSet::new()),
                live: AtomicBool::new(true),
                revision,
            }),
            filter: Arc::new(Mutex::new(filter)),
        }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Query one bounding box.
    ///
    /// Provider failures are logged and yield an empty list; records with
    /// unusable coordinates are dropped individually.
    pub async fn fetch_region(&self, bbox: &BoundingBox) -> Vec<Station> {
        match self.try_fetch_region(bbox).await {
            Ok(stations) => stations,
            Err(e) => {
                warn!("Failed to fetch stations for {}: {}", bbox, e);
                Vec::new()
            }
        }
    }

    async fn try_fetch_region(&self, bbox: &BoundingBox) -> Result<Vec<Station>, ProviderError> {
        let records = self.provider.stations_in(bbox).await?;

        let fetched_at = Utc::now();
        let received = records.len();
        let stations: Vec<Station> = records
            .into_iter()
            .filter_map(|record| record.into_station(fetched_at))
            .collect();

        if stations.len() < received {
            debug!(
                "Skipped {} malformed station records in {}",
                received - stations.len(),
                bbox
            );
        }

        Ok(stations)
    }

    /// Sweep every macro-region concurrently and merge the results.
    pub async fn sweep_world(&self) -> StationSet {
        self.sweep_world_with(|_, _| {}).await
    }

    /// Like [`sweep_world`](Self::sweep_world), calling `on_region` as each
    /// region completes with the number of stations it returned.
    ///
    /// Each region is merged into the shared set as soon as it arrives. The
    /// returned set is the union of this sweep's results only.
    pub async fn sweep_world_with<F>(&self, mut on_region: F) -> StationSet
    where
        F: FnMut(&Region, usize),
    {
        let mut swept = StationSet::new();
        if !self.is_live() {
            debug!("Skipping world sweep on an unmounted aggregator");
            return swept;
        }

        info!("Sweeping {} regions", self.settings.regions.len());

        let mut pending: FuturesUnordered<_> = self
            .settings
            .regions
            .iter()
            .map(|region| async move {
                let stations = self.fetch_region(&region.bounds).await;
                (region, stations)
            })
            .collect();

        while let Some((region, stations)) = pending.next().await {
            debug!("Region {} returned {} stations", region.name, stations.len());
            on_region(region, stations.len());
            swept.merge(stations.iter().cloned());
            self.merge(stations).await;
        }

        if swept.is_empty() {
            warn!("World sweep returned no stations");
        } else {
            info!("World sweep complete: {} stations", swept.len());
        }
        swept
    }

    /// Fetch `bbox` and upsert the results, unless it barely moved since
    /// the last viewport refresh.
    ///
    /// A failed fetch does not count as a refresh, so the same box can be
    /// retried right away.
    pub async fn refresh_viewport(&self, bbox: BoundingBox) -> ViewportRefresh {
        let previous = {
            let mut filter = self.lock_filter();
            let previous = filter.last().copied();
            if !filter.admit(bbox) {
                debug!("Viewport {} within epsilon of last refresh", bbox);
                return ViewportRefresh::Skipped;
            }
            previous
        };

        let stations = match self.try_fetch_region(&bbox).await {
            Ok(stations) => stations,
            Err(e) => {
                warn!("Viewport refresh {} failed: {}", bbox, e);
                self.lock_filter().forget(&bbox, previous);
                return ViewportRefresh::Failed;
            }
        };
        let count = stations.len();
        self.merge(stations).await;

        debug!("Viewport refresh {} returned {} stations", bbox, count);
        ViewportRefresh::Refreshed(count)
    }

    fn lock_filter(&self) -> MutexGuard<'_, ViewportFilter> {
        self.filter.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Read the host's bounds on demand and refresh them. No-op while the
    /// host has no bounds.
    pub async fn refresh_from_host(&self, host: &dyn ViewportHost) -> ViewportRefresh {
        match host.current_bounds() {
            Some(bbox) => self.refresh_viewport(bbox).await,
            None => {
                debug!("Viewport host not ready, skipping refresh");
                ViewportRefresh::Unavailable
            }
        }
    }

    /// Snapshot of every known station.
    pub async fn current_stations(&self) -> Vec<Station> {
        self.shared.stations.read().await.snapshot()
    }

    /// Summary over the current set.
    pub async fn summary(&self) -> StationSummary {
        self.shared.stations.read().await.summary()
    }

    /// Receiver bumped after every merge that changed the set.
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// False once the aggregator has been unmounted.
    pub fn is_live(&self) -> bool {
        self.shared.live.load(Ordering::SeqCst)
    }

    /// Stop accepting merges. Waits for any merge in progress to finish, so
    /// nothing mutates the set after this returns.
    pub async fn retire(&self) {
        let _guard = self.shared.stations.write().await;
        self.shared.live.store(false, Ordering::SeqCst);
    }

    /// Non-blocking variant of [`retire`](Self::retire) for `Drop` paths.
    pub fn retire_now(&self) {
        self.shared.live.store(false, Ordering::SeqCst);
    }

    async fn merge(&self, stations: Vec<Station>) -> usize {
        if stations.is_empty() {
            return 0;
        }

        let mut set = self.shared.stations.write().await;
        if !self.is_live() {
            debug!(
                "Discarding {} stations that arrived after unmount",
                stations.len()
            );
            return 0;
        }

        let changed = set.merge(stations);
        drop(set);

        if changed > 0 {
            self.shared.revision.send_modify(|revision| *revision += 1);
        }
        changed
    }
}
