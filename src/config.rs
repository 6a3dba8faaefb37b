//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.airsight.toml` files.

use crate::cli::{ChartFormat, OutputFormat};
use crate::selection::RangeLimits;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".airsight.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// API connection settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Analytics defaults.
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Historical data seeding.
    #[serde(default)]
    pub seed: SeedConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory exported files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Summary report format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            verbose: false,
            format: OutputFormat::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("airsight-output")
}

/// AirSight API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL including the `/api` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User id sent as `X-User-Id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Value of the `Authorization` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_id: None,
            token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Analytics defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Quick-range length when no dates are given.
    #[serde(default = "default_days")]
    pub default_days: u32,

    /// Longest range the server accepts.
    #[serde(default = "default_max_range_days")]
    pub max_range_days: u32,

    /// Write chart files.
    #[serde(default = "default_true")]
    pub charts: bool,

    /// Chart image format.
    #[serde(default)]
    pub chart_format: ChartFormat,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_days: default_days(),
            max_range_days: default_max_range_days(),
            charts: true,
            chart_format: ChartFormat::default(),
        }
    }
}

impl AnalyticsConfig {
    pub fn limits(&self) -> RangeLimits {
        RangeLimits {
            default_days: self.default_days,
            max_range_days: self.max_range_days,
        }
    }
}

fn default_days() -> u32 {
    90
}

fn default_max_range_days() -> u32 {
    1095
}

fn default_true() -> bool {
    true
}

/// Historical data seeding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Years of data to generate.
    #[serde(default = "default_years")]
    pub years: u32,

    /// Seconds between database status checks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Status checks before giving up.
    #[serde(default = "default_max_checks")]
    pub max_checks: u32,

    /// Record count above which the data counts as ready.
    #[serde(default = "default_ready_threshold")]
    pub ready_threshold: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            years: default_years(),
            poll_interval_seconds: default_poll_interval(),
            max_checks: default_max_checks(),
            ready_threshold: default_ready_threshold(),
        }
    }
}

impl SeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

fn default_years() -> u32 {
    3
}

fn default_poll_interval() -> u64 {
    30
}

fn default_max_checks() -> u32 {
    20
}

fn default_ready_threshold() -> u64 {
    1000
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(ref token) = args.token {
            self.api.token = Some(token.clone());
        }
        if let Some(ref user_id) = args.user_id {
            self.api.user_id = Some(user_id.clone());
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }

        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if args.no_charts {
            self.analytics.charts = false;
        }
        if let Some(chart_format) = args.chart_format {
            self.analytics.chart_format = chart_format;
        }

        if let Some(years) = args.years {
            self.seed.years = years;
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
