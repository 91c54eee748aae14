use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use conditions_navigator::config::LoggingConfig;
use conditions_navigator::{
    ConditionsNavigator, DaySelection, FilterEngine, ForecastCache, MountainCatalog,
    NavigatorConfig, OpenMeteoForecastSource, Severity, web,
};

#[derive(Parser)]
#[command(
    name = "conditions-navigator",
    version,
    about = "Mountain weather conditions at a glance",
    long_about = "Fetches seven-day forecasts for a catalog of mountains \
                  and rates each day as ok, marginal or bad."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (TOML)
    #[arg(long, short = 'c', global = true, env = "CONDITIONS_NAVIGATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the mountain catalog
    Mountains,

    /// Fetch forecasts and show daily severities
    Forecast {
        /// Show the full daily table for one mountain
        #[arg(long, short = 'm')]
        mountain: Option<String>,
    },

    /// Fetch forecasts and color mountains by the selected days
    Filter {
        /// Forecast day to include, 1 (today) to 7
        #[arg(
            long = "day",
            short = 'd',
            required = true,
            value_parser = clap::value_parser!(u8).range(1..=7)
        )]
        days: Vec<u8>,
    },

    /// Serve the JSON API
    Serve {
        /// Port override
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },
}

fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level))
        .add_directive(
            "hyper=warn"
                .parse()
                .unwrap_or_else(|_| tracing::Level::WARN.into()),
        )
        .add_directive(
            "reqwest=warn"
                .parse()
                .unwrap_or_else(|_| tracing::Level::WARN.into()),
        );

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.format == "json" {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

fn load_catalog(config: &NavigatorConfig) -> Result<MountainCatalog> {
    match &config.catalog.path {
        Some(path) => MountainCatalog::from_json_file(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display())),
        None => Ok(MountainCatalog::default()),
    }
}

fn forecast_source(config: &NavigatorConfig) -> Result<OpenMeteoForecastSource> {
    let source = OpenMeteoForecastSource::new(&config.weather)?;
    if !config.cache.enabled {
        return Ok(source);
    }

    match ForecastCache::open(&config.cache.location) {
        Ok(cache) => {
            debug!("Using forecast cache at {}", config.cache.location);
            let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 60 * 60);
            Ok(source.with_cache(cache, ttl))
        }
        Err(e) => {
            warn!("Forecast cache unavailable, continuing without it: {}", e);
            Ok(source)
        }
    }
}

fn print_mountains(catalog: &MountainCatalog) {
    println!("{:<24} {:>20} {:>10}", "Mountain", "Coordinates", "Elevation");
    for mountain in catalog.mountains() {
        println!(
            "{:<24} {:>20} {:>9}m",
            mountain.name(),
            mountain.format_coordinates(),
            mountain.elevation()
        );
    }
}

fn format_value(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}{unit}"))
}

fn print_overview(navigator: &ConditionsNavigator) {
    let labels: Vec<&str> = navigator.toggles().iter().map(|t| t.label.as_str()).collect();
    println!("{:<24} {}", "Mountain", labels.join("  "));

    for entry in navigator.entries() {
        let Some(record) = &entry.record else {
            println!("{:<24} {:?}", entry.mountain.name(), entry.status);
            continue;
        };

        let days: Vec<String> = (0..labels.len())
            .map(|day| {
                let symbol = match FilterEngine::day_severity(entry.mountain.name(), record, day) {
                    Ok(Severity::Ok) => "ok",
                    Ok(Severity::Marginal) => "~",
                    Ok(Severity::Bad) => "X",
                    Err(_) => "-",
                };
                format!("{symbol:<3}")
            })
            .collect();
        println!("{:<24} {}", entry.mountain.name(), days.join("  "));
    }

    let extrema = navigator.extrema();
    println!(
        "\nMax hourly precipitation {:.1}mm, temperature {:.1}°C to {:.1}°C",
        extrema.max_precipitation(),
        extrema.min_temperature(),
        extrema.max_temperature()
    );
}

fn print_mountain_detail(navigator: &ConditionsNavigator, name: &str) -> Result<()> {
    let entry = navigator
        .entry(name)
        .with_context(|| format!("Mountain '{name}' is not in the catalog"))?;
    let record = entry
        .record
        .as_ref()
        .with_context(|| format!("No forecast for {name}: {:?}", entry.status))?;

    println!("{} ({}, {}m)", name, entry.mountain.format_coordinates(), entry.mountain.elevation());
    println!(
        "{:<5} {:<10} {:<26} {:>6} {:>10} {:>10} {:>8}",
        "Day", "Date", "Conditions", "Wind", "Speed", "Gusts", "Precip"
    );
    for (day, row) in record.daily().enumerate() {
        let severity = FilterEngine::day_severity(name, record, day)
            .map_or_else(|_| "-".to_string(), |s| format!("{s:?}"));
        println!(
            "{:<5} {:<10} {:<26} {:>6} {:>10} {:>10} {:>8}  {}",
            row.day_name(),
            row.date,
            row.condition,
            row.wind_direction,
            format_value(row.wind_speed, "km/h"),
            format_value(row.wind_gusts, "km/h"),
            format_value(row.precipitation_sum, "mm"),
            severity
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = NavigatorConfig::load_from_path(cli.config.clone())?;
    init_logging(&config.logging, cli.verbose);

    let catalog = load_catalog(&config)?;
    info!("Catalog has {} mountains", catalog.len());

    match cli.command {
        Command::Mountains => print_mountains(&catalog),
        Command::Forecast { mountain } => {
            let source = forecast_source(&config)?;
            let mut navigator = ConditionsNavigator::new(catalog);
            navigator.retrieve_forecasts(&source).await;

            match mountain {
                Some(name) => print_mountain_detail(&navigator, &name)?,
                None => print_overview(&navigator),
            }
        }
        Command::Filter { days } => {
            let selection = DaySelection::new(days.iter().map(|d| usize::from(*d) - 1))?;
            let source = forecast_source(&config)?;
            let mut navigator = ConditionsNavigator::new(catalog);
            navigator.retrieve_forecasts(&source).await;

            if let Err(e) = navigator.apply_filter(&selection) {
                anyhow::bail!("Could not apply the day filter: {}", e.user_message());
            }

            for marker in navigator.markers() {
                println!("{:<24} {}", marker.name, marker.color.css_name());
            }
        }
        Command::Serve { port } => {
            let source = forecast_source(&config)?;
            let navigator = Arc::new(RwLock::new(ConditionsNavigator::new(catalog)));
            web::spawn_retrieval(navigator.clone(), Arc::new(source));
            web::run(navigator, port.unwrap_or(config.server.port)).await?;
        }
    }

    Ok(())
}
