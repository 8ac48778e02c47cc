//! aqmap - air quality station aggregation for map overlays.
//!
//! Keeps a deduplicated, periodically refreshed set of World Air Quality
//! Index monitoring stations for the visible map region and renders it as
//! overlay markers and reports.
//!
//! ```no_run
//! use aqmap::aggregator::{AggregatorSettings, StationAggregator};
//! use aqmap::config::ProviderConfig;
//! use aqmap::provider::WaqiClient;
//! use aqmap::viewport::MapViewport;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = WaqiClient::new(&ProviderConfig::default())?;
//! let aggregator = StationAggregator::new(Arc::new(client), AggregatorSettings::default());
//! let viewport = Arc::new(MapViewport::new());
//!
//! let mounted = aggregator.mount(viewport.clone());
//! viewport.set_bounds("35,-25,71,45".parse()?);
//! let stations = mounted.current_stations().await;
//! mounted.unmount().await;
//! # let _ = stations;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod render;
pub mod session;
pub mod viewport;

pub use aggregator::{MountedAggregator, StationAggregator, StationSet, ViewportRefresh};
pub use error::AqmapError;
pub use models::{BoundingBox, Position, SeverityBand, Station, StationId};
pub use provider::{StationProvider, WaqiClient};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result alias for configuration and validation failures.
pub type Result<T> = std::result::Result<T, AqmapError>;
