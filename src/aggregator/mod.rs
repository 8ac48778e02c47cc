//! Station aggregation.
//!
//! [`StationAggregator`] owns the shared [`StationSet`] and fills it from
//! world sweeps and viewport refreshes; [`MountedAggregator`] drives it on a
//! timer until unmounted.

pub mod lifecycle;
pub mod regions;
pub mod service;
pub mod station_set;

pub use lifecycle::MountedAggregator;
pub use regions::{default_regions, Region};
pub use service::{AggregatorSettings, StationAggregator, ViewportRefresh};
pub use station_set::{group_by_pollutant, sort_by_severity, StationSet};
