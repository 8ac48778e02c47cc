//! Mounted aggregator: periodic resweeps plus viewport-driven refreshes,
//! torn down on unmount.

use super::service::StationAggregator;
use crate::models::Station;
use crate::viewport::ViewportHost;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

impl StationAggregator {
    /// Attach to a viewport host and start the background loop.
    ///
    /// The loop runs an initial sweep, refreshes the host's current bounds
    /// once, then resweeps on the configured interval and refreshes on every
    /// bounds change until unmounted.
    pub fn mount(&self, viewport: Arc<dyn ViewportHost>) -> MountedAggregator {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_mounted(self.clone(), viewport, shutdown_rx));
        info!(
            "Aggregator mounted (resweep every {}s)",
            self.settings().sweep_interval.as_secs()
        );

        MountedAggregator {
            aggregator: self.clone(),
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

async fn run_mounted(
    aggregator: StationAggregator,
    viewport: Arc<dyn ViewportHost>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut subscription = viewport.subscribe();
    let mut inflight = JoinSet::new();

    let initial = aggregator.clone();
    let host = viewport.clone();
    inflight.spawn(async move {
        initial.sweep_world().await;
        initial.refresh_from_host(host.as_ref()).await;
    });

    let period = aggregator.settings().sweep_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut viewport_open = true;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                debug!("Periodic resweep");
                let agg = aggregator.clone();
                inflight.spawn(async move {
                    agg.sweep_world().await;
                });
            }
            changed = subscription.changed(), if viewport_open => match changed {
                Some(bbox) => {
                    let agg = aggregator.clone();
                    inflight.spawn(async move {
                        agg.refresh_viewport(bbox).await;
                    });
                }
                None => {
                    debug!("Viewport host closed; continuing with periodic sweeps only");
                    viewport_open = false;
                }
            },
            Some(_) = inflight.join_next(), if !inflight.is_empty() => {}
        }
    }

    debug!("Mounted loop exiting");
    // Dropping the JoinSet aborts in-flight fetches; the subscription is
    // released with it.
}

/// Handle for a mounted aggregator. Unmounts on drop.
pub struct MountedAggregator {
    aggregator: StationAggregator,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MountedAggregator {
    pub fn aggregator(&self) -> &StationAggregator {
        &self.aggregator
    }

    /// Snapshot of every known station.
    pub async fn current_stations(&self) -> Vec<Station> {
        self.aggregator.current_stations().await
    }

    /// Receiver bumped after every merge that changed the set.
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.aggregator.updates()
    }

    /// Stop the timer, release the viewport and freeze the station set.
    pub async fn unmount(mut self) {
        self.aggregator.retire().await;
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!("Aggregator unmounted");
    }

    fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for MountedAggregator {
    fn drop(&mut self) {
        self.aggregator.retire_now();
        self.stop();
    }
}
