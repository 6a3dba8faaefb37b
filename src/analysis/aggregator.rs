//! Reading aggregation and statistics.
//!
//! This module provides the pure functions that turn a session's raw
//! readings into summary statistics, AQI histograms and chart-ready series.

use crate::analysis::buckets::{BucketSet, CategoryHistogram, Histogram};
use crate::error::AnalyticsError;
use crate::models::{Pollutant, PollutantAverage, Reading, SummaryStats, TimeSeriesPoint};

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute count, average, maximum and minimum AQI.
pub fn compute_summary(readings: &[Reading]) -> Result<SummaryStats, AnalyticsError> {
    let first = readings.first().ok_or(AnalyticsError::EmptyInput)?;

    let mut sum: i64 = 0;
    let mut maximum = first.aqi_value;
    let mut minimum = first.aqi_value;

    for reading in readings {
        sum += i64::from(reading.aqi_value);
        maximum = maximum.max(reading.aqi_value);
        minimum = minimum.min(reading.aqi_value);
    }

    Ok(SummaryStats {
        count: readings.len(),
        average: round2(sum as f64 / readings.len() as f64),
        maximum,
        minimum,
    })
}

/// Bucket readings into the AQI category histogram.
pub fn categorize(readings: &[Reading]) -> CategoryHistogram {
    bucketize(readings, BucketSet::Category)
}

/// Bucket readings into the pollution-level distribution histogram.
pub fn distribution(readings: &[Reading]) -> Histogram {
    bucketize(readings, BucketSet::Distribution)
}

fn bucketize(readings: &[Reading], set: BucketSet) -> Histogram {
    let mut histogram = Histogram::new(set);

    for reading in readings {
        histogram.record(reading.aqi_value);
    }

    histogram
}

/// Mean concentration of one pollutant, ignoring missing values.
///
/// Returns 0 when no reading carries the pollutant.
pub fn average_by_pollutant(readings: &[Reading], pollutant: Pollutant) -> f64 {
    let values: Vec<f64> = readings
        .iter()
        .filter_map(|r| r.pollutants.get(pollutant))
        .filter(|v| v.is_finite())
        .collect();

    if values.is_empty() {
        return 0.0;
    }

    round2(values.iter().sum::<f64>() / values.len() as f64)
}

/// Averages of all six pollutants in display order.
pub fn pollutant_averages(readings: &[Reading]) -> Vec<PollutantAverage> {
    Pollutant::ALL
        .iter()
        .map(|&pollutant| PollutantAverage {
            pollutant,
            label: pollutant.label().to_string(),
            unit: pollutant.unit().to_string(),
            average: average_by_pollutant(readings, pollutant),
        })
        .collect()
}

/// Chart-ready time series sorted by timestamp.
///
/// The sort is stable: readings sharing a timestamp keep their input order.
pub fn to_time_series(readings: &[Reading]) -> Vec<TimeSeriesPoint> {
    let mut series: Vec<TimeSeriesPoint> = readings
        .iter()
        .map(|r| TimeSeriesPoint {
            timestamp: r.timestamp,
            aqi_value: r.aqi_value,
            pollutants: r.pollutants,
        })
        .collect();

    series.sort_by_key(|p| p.timestamp);
    series
}

/// Share of each entry in a set of counts, as a percentage with one decimal.
pub fn percentages(counts: &[usize]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }

    counts
        .iter()
        .map(|&c| ((c as f64 * 100.0 / total as f64) * 10.0).round() / 10.0)
        .collect()
}
