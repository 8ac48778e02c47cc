//! aqmap - live air quality station map
//!
//! A CLI that sweeps World Air Quality Index stations, keeps them fresh
//! for the current viewport and writes overlay snapshots.
//!
//! Exit codes:
//!   0 - Success (no station above threshold, or no --fail-on set)
//!   1 - Runtime error (config, output file, etc.)
//!   2 - Stations found at or above the --fail-on band

use anyhow::{Context, Result};
use aqmap::aggregator::{AggregatorSettings, StationAggregator};
use aqmap::cli::Args;
use aqmap::config::{Config, DEFAULT_CONFIG_FILE};
use aqmap::models::{SeverityBand, StationSummary};
use aqmap::provider::{StationProvider, WaqiClient};
use aqmap::render::{self, OverlaySnapshot};
use aqmap::viewport::{feed_bounds, MapViewport};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("aqmap v{}", aqmap::VERSION);
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("aqmap failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .aqmap.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize regions, intervals and the provider URL.");
    println!("   Set AQMAP_WAQI_TOKEN (or provider.token) before running.");
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` wins when set.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Dispatch to the selected mode. Returns exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let client = WaqiClient::new(&config.provider).context("Failed to build WAQI client")?;
    if !client.has_token() {
        warn!("No WAQI token configured; set AQMAP_WAQI_TOKEN or provider.token");
    }
    let provider: Arc<dyn StationProvider> = Arc::new(client);

    if let Some(point) = args.point {
        return run_point(provider.as_ref(), point.lat, point.lng).await;
    }

    let aggregator = StationAggregator::new(provider, AggregatorSettings::from(&config.aggregator));

    if args.once {
        run_once(&args, &config, &aggregator).await
    } else {
        run_watch(&args, &config, &aggregator).await
    }
}

/// --point: print an info card for one location.
async fn run_point(provider: &dyn StationProvider, lat: f64, lng: f64) -> Result<i32> {
    let reading = match provider.point_reading(lat, lng).await {
        Ok(reading) => Some(reading),
        Err(e) => {
            warn!("Point lookup failed: {}", e);
            None
        }
    };

    println!("{}", render::info_card(reading.as_ref()));
    Ok(0)
}

/// --once: one world sweep (plus --bbox if given), one snapshot.
async fn run_once(args: &Args, config: &Config, aggregator: &StationAggregator) -> Result<i32> {
    let start_time = Instant::now();
    let regions = &aggregator.settings().regions;

    println!("🌍 Sweeping {} regions...", regions.len());

    let progress = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new(regions.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    };

    aggregator
        .sweep_world_with(|region, count| {
            if let Some(ref pb) = progress {
                pb.set_message(format!("{} ({} stations)", region.name, count));
                pb.inc(1);
            }
        })
        .await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if let Some(bbox) = args.bbox {
        aggregator.refresh_viewport(bbox).await;
    }

    let stations = aggregator.current_stations().await;
    let snapshot = OverlaySnapshot::new(&stations, regions, config.report.top_stations);
    let output = Path::new(&config.general.output);
    render::write_snapshot(&snapshot, args.format, output)
        .with_context(|| format!("Failed to write snapshot to {}", output.display()))?;

    print_summary(&snapshot.summary);
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!("\n✅ Snapshot saved to: {}", output.display());

    if let Some(fail_on) = args.fail_on {
        let band = SeverityBand::from(fail_on);
        let above = snapshot.summary.at_or_above(band);
        if above > 0 {
            eprintln!(
                "\n⛔ {} stations at or above '{}'. Failing (exit code 2).",
                above, band
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Default mode: mount the aggregator, follow the viewport and rewrite the
/// snapshot on every change until Ctrl-C.
async fn run_watch(args: &Args, config: &Config, aggregator: &StationAggregator) -> Result<i32> {
    let viewport = Arc::new(match args.bbox {
        Some(bbox) => MapViewport::with_bounds(bbox),
        None => MapViewport::new(),
    });

    let mounted = aggregator.mount(viewport.clone());
    let mut updates = mounted.updates();

    let feeder = if args.no_stdin {
        None
    } else {
        let viewport = viewport.clone();
        Some(tokio::spawn(async move {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            match feed_bounds(stdin, &viewport).await {
                Ok(count) => debug!("Viewport input closed after {} boxes", count),
                Err(e) => warn!("Failed to read viewport input: {}", e),
            }
        }))
    };

    let output = Path::new(&config.general.output);
    println!(
        "👀 Watching stations (resweep every {} min). Press Ctrl-C to stop.",
        config.aggregator.sweep_interval_minutes
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let stations = mounted.current_stations().await;
                let snapshot = OverlaySnapshot::new(
                    &stations,
                    &aggregator.settings().regions,
                    config.report.top_stations,
                );
                render::write_snapshot(&snapshot, args.format, output)
                    .with_context(|| format!("Failed to write snapshot to {}", output.display()))?;
                info!(
                    "{} stations ({} with readings) -> {}",
                    snapshot.total_stations,
                    snapshot.markers.len(),
                    output.display()
                );
            }
        }
    }

    if let Some(feeder) = feeder {
        feeder.abort();
    }
    mounted.unmount().await;

    let summary = aggregator.summary().await;
    print_summary(&summary);
    println!("\n✅ Stopped. Last snapshot in: {}", output.display());
    Ok(0)
}

fn print_summary(summary: &StationSummary) {
    println!("\n📊 Station Summary:");
    println!("   Stations: {}", summary.total);
    if summary.without_reading > 0 {
        println!("   Without reading: {}", summary.without_reading);
    }
    let bands: Vec<String> = SeverityBand::ALL
        .iter()
        .map(|band| format!("{} {}", band.emoji(), summary.count(*band)))
        .collect();
    println!("   {}", bands.join(" | "));
    if let Some(max) = summary.max_aqi {
        println!("   Highest AQI: {} ({})", max, SeverityBand::from_aqi(max));
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
