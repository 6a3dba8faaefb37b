//! AirSight - historical air-quality analytics
//!
//! A CLI tool that fetches historical AQI readings from the AirSight API,
//! aggregates them into summary statistics and category histograms, and
//! writes charts and reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime or validation error (bad dates, connection failure, etc.)
//!   2 - No data available for the selected city and range

mod analysis;
mod api;
mod aqi;
mod charts;
mod cli;
mod commands;
mod config;
mod error;
mod export;
mod models;
mod report;
mod selection;
mod session;

use anyhow::{Context, Result};
use api::{AqiApiClient, ApiConfig};
use cli::{Args, Mode};
use config::{Config, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};
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
    if args.mode() == Mode::InitConfig {
        let code = handle_init_config()?;
        std::process::exit(code);
    }

    // Load configuration first so its verbosity applies to logging
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("AirSight v{}", env!("CARGO_PKG_VERSION"));
    source.log();
    debug!("Arguments: {:?}", args);

    match run(&args, &config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .airsight.toml.
fn handle_init_config() -> Result<i32> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        return Ok(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the API URL, credentials, and output directory.");
    Ok(0)
}

/// Initialize logging at the given level.
///
/// `RUST_LOG` still wins when set.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch to the selected command. Returns the exit code.
async fn run(args: &Args, config: &Config) -> Result<i32> {
    let client = AqiApiClient::new(ApiConfig::from(&config.api))?;

    match args.mode() {
        Mode::ListCities => commands::run_list_cities(&client).await,
        Mode::Status => commands::run_status(&client, config).await,
        Mode::Seed => commands::run_seed(&client, config, args.wait, !args.quiet).await,
        Mode::Analyze => commands::run_analytics(args, config, &client).await,
        Mode::InitConfig => handle_init_config(),
    }
}

/// Where the configuration came from. Logged once logging is set up.
enum ConfigSource {
    File(PathBuf),
    Defaults,
    Invalid(String),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::Invalid(e) => warn!("Failed to load config: {}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::File(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Invalid(format!("{:#}", e)))),
    }
}
