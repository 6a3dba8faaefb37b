//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::charts::render::ImageFormat;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// AirSight - historical air-quality analytics
///
/// Fetches historical AQI readings for a city from the AirSight API,
/// summarises them, and writes charts and reports.
///
/// Examples:
///   airsight --city Delhi
///   airsight --city Delhi --start 2024-01-01 --end 2024-03-31 --csv --pdf
///   airsight --city Mumbai --days 7 --format json
///   airsight --list-cities
///   airsight --seed --years 3 --wait
///   airsight --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// City to analyze
    #[arg(long, value_name = "CITY")]
    pub city: Option<String>,

    /// Range start (YYYY-MM-DD, YYYY-MM-DDTHH:MM or YYYY-MM-DDTHH:MM:SS)
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// Range end (same formats as --start)
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,

    /// Quick range: the last N days up to now
    ///
    /// Used instead of --start/--end. Defaults to 90 days (or the config
    /// file's default_days) when no dates are given.
    #[arg(long, value_name = "N", conflicts_with_all = ["start", "end"])]
    pub days: Option<u32>,

    /// AirSight API base URL
    #[arg(long, value_name = "URL", env = "AIRSIGHT_API_URL")]
    pub api_url: Option<String>,

    /// Authorization header value for historical data
    #[arg(long, value_name = "TOKEN", env = "AIRSIGHT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// User id sent as X-User-Id
    #[arg(long, value_name = "ID", env = "AIRSIGHT_USER_ID")]
    pub user_id: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory for charts, reports and downloads
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Summary report format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Skip writing chart files
    #[arg(long)]
    pub no_charts: bool,

    /// Chart image format (png, svg, both)
    #[arg(long, value_name = "FORMAT", conflicts_with = "no_charts")]
    pub chart_format: Option<ChartFormat>,

    /// Also download the CSV export
    #[arg(long)]
    pub csv: bool,

    /// Also download the analytics PDF report
    #[arg(long)]
    pub pdf: bool,

    /// List cities with data and exit
    #[arg(long, conflicts_with_all = ["status", "seed"])]
    pub list_cities: bool,

    /// Show database status and exit
    #[arg(long, conflicts_with = "seed")]
    pub status: bool,

    /// Ask the server to generate historical sample data
    #[arg(long)]
    pub seed: bool,

    /// Years of data to generate with --seed
    #[arg(long, value_name = "N", requires = "seed")]
    pub years: Option<u32>,

    /// Wait until seeded data is available
    #[arg(long, requires = "seed")]
    pub wait: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .airsight.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .airsight.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the summary report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

/// Image format(s) for chart files.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    /// PNG images (default)
    #[default]
    Png,
    /// SVG documents
    Svg,
    /// Both PNG and SVG
    Both,
}

impl ChartFormat {
    pub fn images(&self) -> &'static [ImageFormat] {
        match self {
            ChartFormat::Png => &[ImageFormat::Png],
            ChartFormat::Svg => &[ImageFormat::Svg],
            ChartFormat::Both => &[ImageFormat::Png, ImageFormat::Svg],
        }
    }
}

/// What a single invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    InitConfig,
    ListCities,
    Status,
    Seed,
    Analyze,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The action selected by the flags.
    pub fn mode(&self) -> Mode {
        if self.init_config {
            Mode::InitConfig
        } else if self.seed {
            Mode::Seed
        } else if self.status {
            Mode::Status
        } else if self.list_cities {
            Mode::ListCities
        } else {
            Mode::Analyze
        }
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

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.days == Some(0) {
            return Err("Days must be at least 1".to_string());
        }

        if self.years == Some(0) {
            return Err("Years must be at least 1".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the config file's `general.verbose`; `--quiet`
    /// overrides it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
