//! Data models for AirSight analytics.
//!
//! This module contains the core data structures used throughout
//! the application for representing readings, derived statistics, and reports.

use crate::analysis::HistogramEntry;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six pollutants tracked alongside the AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    So2,
    Co,
    O3,
}

impl Pollutant {
    /// All pollutants in chart display order.
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Co,
        Pollutant::O3,
    ];

    /// Human-readable label used on charts and in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO2",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
            Pollutant::O3 => "O3",
        }
    }

    /// Concentration unit reported by the API.
    pub fn unit(&self) -> &'static str {
        match self {
            Pollutant::Co => "mg/m³",
            _ => "µg/m³",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Optional pollutant concentrations attached to a reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PollutantSnapshot {
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
    #[serde(default)]
    pub no2: Option<f64>,
    #[serde(default)]
    pub so2: Option<f64>,
    #[serde(default)]
    pub co: Option<f64>,
    #[serde(default)]
    pub o3: Option<f64>,
}

impl PollutantSnapshot {
    /// Returns the concentration for one pollutant, if present.
    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
            Pollutant::No2 => self.no2,
            Pollutant::So2 => self.so2,
            Pollutant::Co => self.co,
            Pollutant::O3 => self.o3,
        }
    }

    /// True when no pollutant concentration is present.
    pub fn is_empty(&self) -> bool {
        Pollutant::ALL.iter().all(|p| self.get(*p).is_none())
    }
}

/// A single timestamped air-quality sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Instant the sample was taken (server local time).
    pub timestamp: NaiveDateTime,
    /// Air Quality Index value (0-500+).
    pub aqi_value: i32,
    /// Pollutant breakdown.
    #[serde(flatten)]
    pub pollutants: PollutantSnapshot,
}

impl Reading {
    /// Creates a reading without any pollutant breakdown.
    pub fn new(timestamp: NaiveDateTime, aqi_value: i32) -> Self {
        Self {
            timestamp,
            aqi_value,
            pollutants: PollutantSnapshot::default(),
        }
    }

    /// Attaches a pollutant breakdown.
    pub fn with_pollutants(mut self, pollutants: PollutantSnapshot) -> Self {
        self.pollutants = pollutants;
        self
    }
}

/// One point of the chart-ready AQI time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub timestamp: NaiveDateTime,
    pub aqi_value: i32,
    pub pollutants: PollutantSnapshot,
}

/// Summary statistics over a session's AQI values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of readings.
    pub count: usize,
    /// Mean AQI rounded to two decimals.
    pub average: f64,
    /// Highest AQI observed.
    pub maximum: i32,
    /// Lowest AQI observed.
    pub minimum: i32,
}

/// Metadata about an analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// City the readings belong to.
    pub city: String,
    /// Requested range start.
    pub start: NaiveDateTime,
    /// Requested range end.
    pub end: NaiveDateTime,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// API the data was fetched from.
    pub api_url: String,
    /// Whether the server down-sampled the series.
    pub was_sampled: bool,
    /// Days covered by the server response.
    pub days_covered: i64,
    /// Time spent fetching and aggregating, in seconds.
    pub duration_seconds: f64,
}

/// Average concentration of one pollutant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollutantAverage {
    pub pollutant: Pollutant,
    pub label: String,
    pub unit: String,
    pub average: f64,
}

/// The complete analytics report for one session.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub metadata: ReportMetadata,
    pub summary: SummaryStats,
    /// AQI category buckets.
    pub categories: Vec<HistogramEntry>,
    /// Pollution-level distribution, every bucket included.
    pub distribution: Vec<HistogramEntry>,
    pub pollutant_averages: Vec<PollutantAverage>,
    /// Chart artifacts written alongside the report.
    pub chart_files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn test_pollutant_labels() {
        let labels: Vec<_> = Pollutant::ALL.iter().map(|p| p.label()).collect();
        assert_eq!(labels, vec!["PM2.5", "PM10", "NO2", "SO2", "CO", "O3"]);
        assert_eq!(Pollutant::Co.unit(), "mg/m³");
        assert_eq!(Pollutant::Pm25.to_string(), "PM2.5");
    }

    #[test]
    fn test_reading_deserialize_camel_case() {
        let json = r#"{"timestamp":"2024-03-01T10:00:00","aqiValue":87,"pm25":21.5,"pm10":null,"o3":40.0}"#;
        let reading: Reading = serde_json::from_str(json).unwrap();

        assert_eq!(reading.timestamp, ts("2024-03-01T10:00:00"));
        assert_eq!(reading.aqi_value, 87);
        assert_eq!(reading.pollutants.pm25, Some(21.5));
        assert_eq!(reading.pollutants.pm10, None);
        assert_eq!(reading.pollutants.no2, None);
        assert_eq!(reading.pollutants.get(Pollutant::O3), Some(40.0));
    }

    #[test]
    fn test_snapshot_is_empty() {
        assert!(PollutantSnapshot::default().is_empty());
        let snapshot = PollutantSnapshot {
            co: Some(0.4),
            ..Default::default()
        };
        assert!(!snapshot.is_empty());
    }
}
