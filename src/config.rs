//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.aqmap.toml` files.

use crate::aggregator::{default_regions, Region};
use crate::error::AqmapError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".aqmap.toml";

/// Longest accepted sweep interval (one day).
pub const MAX_SWEEP_INTERVAL_MINUTES: u64 = 24 * 60;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Air quality provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Aggregator settings.
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "aqmap_stations.md".to_string()
}

/// WAQI provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API token. Usually supplied through `AQMAP_WAQI_TOKEN` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.waqi.info".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Aggregator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Minutes between world sweeps in watch mode.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,

    /// Minimum edge movement, in degrees, that triggers a viewport refresh.
    #[serde(default = "default_epsilon")]
    pub viewport_epsilon: f64,

    /// Macro-regions covered by a world sweep.
    #[serde(default = "default_regions")]
    pub regions: Vec<Region>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            sweep_interval_minutes: default_sweep_interval(),
            viewport_epsilon: default_epsilon(),
            regions: default_regions(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    15
}

fn default_epsilon() -> f64 {
    0.01
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of worst stations listed in the report.
    #[serde(default = "default_top_stations")]
    pub top_stations: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_stations: default_top_stations(),
        }
    }
}

fn default_top_stations() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), AqmapError> {
        let interval = self.aggregator.sweep_interval_minutes;
        if !(1..=MAX_SWEEP_INTERVAL_MINUTES).contains(&interval) {
            return Err(AqmapError::config(format!(
                "aggregator.sweep_interval_minutes must be between 1 and {}, got {}",
                MAX_SWEEP_INTERVAL_MINUTES, interval
            )));
        }

        let epsilon = self.aggregator.viewport_epsilon;
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(AqmapError::config(format!(
                "aggregator.viewport_epsilon must be a non-negative number, got {}",
                epsilon
            )));
        }

        if self.aggregator.regions.is_empty() {
            return Err(AqmapError::config("aggregator.regions must not be empty"));
        }

        for region in &self.aggregator.regions {
            region.bounds.validate().map_err(|e| {
                AqmapError::config(format!("region '{}': {}", region.name, e.user_message()))
            })?;
        }

        if self.provider.timeout_seconds == 0 {
            return Err(AqmapError::config(
                "provider.timeout_seconds must be at least 1",
            ));
        }

        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref token) = args.token {
            self.provider.token = Some(token.clone());
        }
        if let Some(ref base_url) = args.base_url {
            self.provider.base_url = base_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.provider.timeout_seconds = timeout;
        }

        if let Some(interval) = args.interval {
            self.aggregator.sweep_interval_minutes = interval;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().into_owned();
        }
        if let Some(top) = args.top {
            self.report.top_stations = top;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
