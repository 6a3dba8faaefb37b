//! AQI bucket sets and histograms.
//!
//! Two labelled bucket sets share the same numeric thresholds: the
//! category set backs the doughnut chart and the distribution set backs
//! the pollution-level bar chart. They are kept separate on purpose
//! until their labels are reconciled.

use serde::{Deserialize, Serialize};

/// Inclusive upper bounds of the first five buckets; the sixth is open.
pub const THRESHOLDS: [i32; 5] = [50, 100, 150, 200, 300];

/// Number of buckets in every set.
pub const BUCKET_COUNT: usize = THRESHOLDS.len() + 1;

/// Index of the bucket an AQI value falls into.
pub fn bucket_index(aqi: i32) -> usize {
    THRESHOLDS
        .iter()
        .position(|&upper| aqi <= upper)
        .unwrap_or(THRESHOLDS.len())
}

/// A named labelling of the six AQI buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketSet {
    /// Health categories (Good .. Hazardous).
    Category,
    /// Pollution levels (Very Low .. Extreme).
    Distribution,
}

const CATEGORY_LABELS: [&str; BUCKET_COUNT] = [
    "Good (0-50)",
    "Moderate (51-100)",
    "Unhealthy for Sensitive (101-150)",
    "Unhealthy (151-200)",
    "Very Unhealthy (201-300)",
    "Hazardous (301+)",
];

const DISTRIBUTION_LABELS: [&str; BUCKET_COUNT] = [
    "Very Low (0-50)",
    "Low (51-100)",
    "Medium (101-150)",
    "High (151-200)",
    "Very High (201-300)",
    "Extreme (301+)",
];

const CATEGORY_COLORS: [&str; BUCKET_COUNT] = [
    "#00ff88", "#ffff00", "#ff8800", "#ff0000", "#8800ff", "#880000",
];

const DISTRIBUTION_COLORS: [&str; BUCKET_COUNT] = [
    "rgba(0, 255, 136, 0.8)",
    "rgba(255, 255, 0, 0.8)",
    "rgba(255, 136, 0, 0.8)",
    "rgba(255, 0, 0, 0.8)",
    "rgba(136, 0, 255, 0.8)",
    "rgba(136, 0, 0, 0.8)",
];

impl BucketSet {
    pub fn labels(&self) -> &'static [&'static str; BUCKET_COUNT] {
        match self {
            BucketSet::Category => &CATEGORY_LABELS,
            BucketSet::Distribution => &DISTRIBUTION_LABELS,
        }
    }

    pub fn colors(&self) -> &'static [&'static str; BUCKET_COUNT] {
        match self {
            BucketSet::Category => &CATEGORY_COLORS,
            BucketSet::Distribution => &DISTRIBUTION_COLORS,
        }
    }
}

/// One bucket of a histogram, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramEntry {
    pub label: String,
    pub count: usize,
    pub color: String,
}

/// Counts of readings per AQI bucket.
///
/// Every bucket is kept, including empty ones, so totals can always be
/// checked against the input length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    set: BucketSet,
    counts: [usize; BUCKET_COUNT],
}

/// Histogram over the category bucket set.
pub type CategoryHistogram = Histogram;

impl Histogram {
    /// Creates an empty histogram for the given bucket set.
    pub fn new(set: BucketSet) -> Self {
        Self {
            set,
            counts: [0; BUCKET_COUNT],
        }
    }

    /// Records one AQI value.
    pub fn record(&mut self, aqi: i32) {
        self.counts[bucket_index(aqi)] += 1;
    }

    pub fn set(&self) -> BucketSet {
        self.set
    }

    /// Raw counts in bucket order.
    pub fn counts(&self) -> &[usize; BUCKET_COUNT] {
        &self.counts
    }

    /// Count for the bucket with the given label.
    pub fn count_for(&self, label: &str) -> Option<usize> {
        self.set
            .labels()
            .iter()
            .position(|l| *l == label)
            .map(|i| self.counts[i])
    }

    /// Sum of all bucket counts.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// All buckets, empty ones included.
    pub fn entries(&self) -> Vec<HistogramEntry> {
        let labels = self.set.labels();
        let colors = self.set.colors();

        self.counts
            .iter()
            .enumerate()
            .map(|(i, &count)| HistogramEntry {
                label: labels[i].to_string(),
                count,
                color: colors[i].to_string(),
            })
            .collect()
    }

    /// Buckets with a non-zero count, for charts that hide empty slices.
    pub fn chart_entries(&self) -> Vec<HistogramEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.count > 0)
            .collect()
    }
}
