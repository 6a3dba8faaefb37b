//! Wire types for the AirSight API.

use crate::aqi;
use crate::models::{PollutantSnapshot, Reading};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A reading as sent by the server. `aqiValue` may be missing on older
/// records, in which case it is derived from the pollutant concentrations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReading {
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub aqi_value: Option<i32>,
    #[serde(flatten)]
    pub pollutants: PollutantSnapshot,
}

impl From<RawReading> for Reading {
    fn from(raw: RawReading) -> Self {
        let aqi_value = raw
            .aqi_value
            .unwrap_or_else(|| aqi::calculate_aqi(&raw.pollutants));

        Reading {
            timestamp: raw.timestamp,
            aqi_value,
            pollutants: raw.pollutants,
        }
    }
}

/// `GET /aqi/cities`
#[derive(Debug, Clone, Deserialize)]
pub struct CitiesResponse {
    pub success: bool,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /aqi/historical/{city}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<RawReading>,
    #[serde(default)]
    pub was_sampled: bool,
    #[serde(default)]
    pub days_covered: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Historical readings after normalisation.
#[derive(Debug, Clone)]
pub struct HistoricalData {
    pub readings: Vec<Reading>,
    pub was_sampled: bool,
    pub days_covered: i64,
}

impl From<HistoricalResponse> for HistoricalData {
    fn from(response: HistoricalResponse) -> Self {
        Self {
            readings: response.data.into_iter().map(Reading::from).collect(),
            was_sampled: response.was_sampled,
            days_covered: response.days_covered,
        }
    }
}

/// `POST /admin/seed-historical-data`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /admin/database-status`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub success: bool,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub available_cities: Vec<String>,
}

impl DatabaseStatus {
    /// Whether the server reported too few records and seeding would help.
    ///
    /// A status with `success: false` carries no usable count.
    pub fn needs_seeding(&self, ready_threshold: u64) -> bool {
        self.success && self.total_records < ready_threshold
    }
}

/// Body of an error response, when the server sends one.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Downloadable report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Csv,
    Pdf,
    /// PDF with charts; falls back to [`ExportKind::Pdf`] if unavailable.
    AnalyticsPdf,
}

impl ExportKind {
    /// Endpoint segment under `/export`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ExportKind::Csv => "csv",
            ExportKind::Pdf => "pdf",
            ExportKind::AnalyticsPdf => "analytics-pdf",
        }
    }

    /// Artifact name for the downloaded file.
    pub fn artifact(&self) -> &'static str {
        match self {
            ExportKind::Csv => "air-quality-data",
            ExportKind::Pdf => "air-quality-report",
            ExportKind::AnalyticsPdf => "air-quality-analytics",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportKind::Csv => "csv",
            ExportKind::Pdf | ExportKind::AnalyticsPdf => "pdf",
        }
    }
}

/// A downloaded export.
#[derive(Debug, Clone)]
pub struct ExportPayload {
    /// What was actually served (after any fallback).
    pub kind: ExportKind,
    pub bytes: Vec<u8>,
}
