//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::MAX_SWEEP_INTERVAL_MINUTES;
use crate::models::{BoundingBox, Position, SeverityBand};
use clap::Parser;
use std::path::PathBuf;

/// aqmap - live air quality station map from the World Air Quality Index
///
/// Sweeps the world's monitoring stations, keeps them refreshed for the
/// current map viewport and writes Markdown/JSON overlay snapshots.
///
/// Examples:
///   aqmap --once --format json --output stations.json
///   aqmap --bbox 35,-25,71,45
///   echo "40,-5,50,10" | aqmap
///   aqmap --point 5.6,-0.19
///   aqmap --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// WAQI API token
    ///
    /// Can also be set in .aqmap.toml under [provider].
    #[arg(long, env = "AQMAP_WAQI_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// WAQI API base URL
    #[arg(long, value_name = "URL", env = "AQMAP_WAQI_URL")]
    pub base_url: Option<String>,

    /// Output file path for the station snapshot
    ///
    /// Default: from config or aqmap_stations.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .aqmap.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Run a single world sweep, write the snapshot and exit
    #[arg(long, conflicts_with = "point")]
    pub once: bool,

    /// Look up the station nearest to LAT,LNG and print an info card
    #[arg(long, value_name = "LAT,LNG", value_parser = parse_point, allow_hyphen_values = true)]
    pub point: Option<Position>,

    /// Initial viewport as south,west,north,east
    #[arg(long, value_name = "S,W,N,E", allow_hyphen_values = true)]
    pub bbox: Option<BoundingBox>,

    /// Don't read viewport bounds from stdin in watch mode
    #[arg(long)]
    pub no_stdin: bool,

    /// Minutes between world sweeps in watch mode
    ///
    /// Default: from config or 15.
    #[arg(long, value_name = "MINUTES")]
    pub interval: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of worst stations listed in the report
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Fail if any station is at or above this band
    ///
    /// Only applies to --once. Exit code 2 when the threshold is exceeded.
    #[arg(long, value_name = "BAND", requires = "once")]
    pub fail_on: Option<FailOnBand>,

    /// Generate a default .aqmap.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Severity band for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnBand {
    Moderate,
    Sensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl From<FailOnBand> for SeverityBand {
    fn from(band: FailOnBand) -> Self {
        match band {
            FailOnBand::Moderate => SeverityBand::Moderate,
            FailOnBand::Sensitive => SeverityBand::UnhealthyForSensitiveGroups,
            FailOnBand::Unhealthy => SeverityBand::Unhealthy,
            FailOnBand::VeryUnhealthy => SeverityBand::VeryUnhealthy,
            FailOnBand::Hazardous => SeverityBand::Hazardous,
        }
    }
}

/// Parse `LAT,LNG` into a validated position.
fn parse_point(s: &str) -> Result<Position, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{s}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude '{}': {e}", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude '{}': {e}", lng.trim()))?;

    Position::new(lat, lng).ok_or_else(|| format!("coordinates out of range: {lat},{lng}"))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(interval) = self.interval {
            if interval == 0 {
                return Err("Interval must be at least 1 minute".to_string());
            }
            if interval > MAX_SWEEP_INTERVAL_MINUTES {
                return Err(format!(
                    "Interval must be at most {} minutes",
                    MAX_SWEEP_INTERVAL_MINUTES
                ));
            }
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.top == Some(0) {
            return Err("Top must be at least 1".to_string());
        }

        if self.no_stdin && self.bbox.is_none() && !self.once && self.point.is_none() {
            return Err("Watch mode with --no-stdin needs an initial --bbox".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            token: Some("test-token".to_string()),
            base_url: None,
            output: None,
            config: None,
            verbose: false,
            quiet: false,
            format: OutputFormat::Markdown,
            once: false,
            point: None,
            bbox: None,
            no_stdin: false,
            interval: None,
            timeout: None,
            top: None,
            fail_on: None,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "aqmap",
            "--once",
            "--format",
            "json",
            "--fail-on",
            "very-unhealthy",
            "--bbox",
            "-10,-20,10,20",
        ])
        .unwrap();
        assert!(args.once);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.fail_on, Some(FailOnBand::VeryUnhealthy));
        assert_eq!(
            args.bbox,
            Some(BoundingBox::new(10.0, -10.0, 20.0, -20.0).unwrap())
        );
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(
            parse_point("5.6, -0.19"),
            Ok(Position {
                lat: 5.6,
                lng: -0.19
            })
        );
        assert!(parse_point("5.6").is_err());
        assert!(parse_point("95,0").is_err());
        assert!(parse_point("abc,1").is_err());
    }

    #[test]
    fn test_fail_on_requires_once() {
        let result = Args::try_parse_from(["aqmap", "--fail-on", "hazardous"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_fail_on_maps_to_band() {
        assert_eq!(
            SeverityBand::from(FailOnBand::Sensitive),
            SeverityBand::UnhealthyForSensitiveGroups
        );
        assert_eq!(
            SeverityBand::from(FailOnBand::Hazardous),
            SeverityBand::Hazardous
        );
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_interval_range() {
        let mut args = make_args();
        args.interval = Some(0);
        assert!(args.validate().is_err());

        args.interval = Some(4_611_686_018_427_387_904);
        assert!(args.validate().is_err());

        args.interval = Some(MAX_SWEEP_INTERVAL_MINUTES);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_watch_without_input() {
        let mut args = make_args();
        args.no_stdin = true;
        assert!(args.validate().is_err());

        args.bbox = Some(BoundingBox::new(10.0, 0.0, 10.0, 0.0).unwrap());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
