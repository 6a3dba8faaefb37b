//! Chart-ready datasets for the four analytics charts.
//!
//! A [`ChartSet`] is built from one session as a unit and replaced as a
//! unit; individual charts are never updated in place.

pub mod render;

use crate::analysis::{self, Histogram, HistogramEntry};
use crate::aqi::AqiCategory;
use crate::models::{PollutantAverage, TimeSeriesPoint};
use crate::session::AnalyticsSession;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

/// Upper bound of the AQI trend chart's y axis.
pub const TREND_Y_MAX: f64 = 500.0;

/// Bar colours for the pollutant averages, in [`crate::models::Pollutant::ALL`] order.
const POLLUTANT_COLORS: [&str; 6] = [
    "rgba(84, 160, 255, 0.8)",
    "rgba(95, 39, 205, 0.8)",
    "rgba(255, 159, 243, 0.8)",
    "rgba(255, 107, 107, 0.8)",
    "rgba(16, 172, 132, 0.8)",
    "rgba(255, 234, 167, 0.8)",
];

/// Identifies one of the analytics charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartId {
    AqiTrend,
    PollutantsBar,
    AqiCategories,
    PollutionDistribution,
}

impl ChartId {
    pub const ALL: [ChartId; 4] = [
        ChartId::AqiTrend,
        ChartId::PollutantsBar,
        ChartId::AqiCategories,
        ChartId::PollutionDistribution,
    ];

    /// Artifact name used for exported files.
    pub fn artifact(&self) -> &'static str {
        match self {
            ChartId::AqiTrend => "aqi-trend",
            ChartId::PollutantsBar => "pollutants-bar",
            ChartId::AqiCategories => "aqi-categories",
            ChartId::PollutionDistribution => "pollution-distribution",
        }
    }

    /// Chart heading; the city is appended to form the title.
    pub fn heading(&self) -> &'static str {
        match self {
            ChartId::AqiTrend => "AQI Trend",
            ChartId::PollutantsBar => "Average Pollutant Levels",
            ChartId::AqiCategories => "AQI Category Distribution",
            ChartId::PollutionDistribution => "Pollution Level Distribution",
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            ChartId::AqiTrend => ChartKind::Line,
            ChartId::PollutantsBar | ChartId::PollutionDistribution => ChartKind::Bar,
            ChartId::AqiCategories => ChartKind::Doughnut,
        }
    }
}

/// Visual form of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Doughnut,
}

/// One point of the AQI trend line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: NaiveDateTime,
    pub value: i32,
    pub color: String,
}

/// One labelled value of a bar or doughnut chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalPoint {
    pub label: String,
    pub value: f64,
    pub color: String,
}

/// Data carried by a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "points", rename_all = "snake_case")]
pub enum ChartData {
    TimeSeries(Vec<TrendPoint>),
    Categorical(Vec<CategoricalPoint>),
}

impl ChartData {
    pub fn len(&self) -> usize {
        match self {
            ChartData::TimeSeries(points) => points.len(),
            ChartData::Categorical(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fully specified chart, independent of any rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: ChartId,
    pub kind: ChartKind,
    pub title: String,
    pub dataset_label: String,
    pub data: ChartData,
}

impl ChartSpec {
    /// Legend lines as `label: count (share%)`, for doughnut charts.
    pub fn share_labels(&self) -> Vec<String> {
        let ChartData::Categorical(points) = &self.data else {
            return Vec::new();
        };

        let counts: Vec<usize> = points.iter().map(|p| p.value.max(0.0) as usize).collect();
        let shares = analysis::percentages(&counts);

        points
            .iter()
            .zip(shares)
            .map(|(p, share)| format!("{}: {} ({:.1}%)", p.label, p.value, share))
            .collect()
    }
}

fn title_for(id: ChartId, city: &str) -> String {
    format!("{} - {}", id.heading(), city)
}

/// AQI over time, each point coloured by its category.
pub fn trend_chart(city: &str, series: &[TimeSeriesPoint]) -> ChartSpec {
    let points = series
        .iter()
        .map(|p| TrendPoint {
            timestamp: p.timestamp,
            value: p.aqi_value,
            color: AqiCategory::from_aqi(p.aqi_value).color().to_string(),
        })
        .collect();

    ChartSpec {
        id: ChartId::AqiTrend,
        kind: ChartKind::Line,
        title: title_for(ChartId::AqiTrend, city),
        dataset_label: "AQI Value".to_string(),
        data: ChartData::TimeSeries(points),
    }
}

/// Average concentration per pollutant.
pub fn pollutants_chart(city: &str, averages: &[PollutantAverage]) -> ChartSpec {
    let points = averages
        .iter()
        .enumerate()
        .map(|(i, avg)| CategoricalPoint {
            label: avg.label.clone(),
            value: avg.average,
            color: POLLUTANT_COLORS[i % POLLUTANT_COLORS.len()].to_string(),
        })
        .collect();

    ChartSpec {
        id: ChartId::PollutantsBar,
        kind: ChartKind::Bar,
        title: title_for(ChartId::PollutantsBar, city),
        dataset_label: "Average Concentration".to_string(),
        data: ChartData::Categorical(points),
    }
}

fn histogram_points(entries: Vec<HistogramEntry>) -> Vec<CategoricalPoint> {
    entries
        .into_iter()
        .map(|e| CategoricalPoint {
            label: e.label,
            value: e.count as f64,
            color: e.color,
        })
        .collect()
}

/// Category doughnut; empty categories are left out.
pub fn categories_chart(city: &str, histogram: &Histogram) -> ChartSpec {
    ChartSpec {
        id: ChartId::AqiCategories,
        kind: ChartKind::Doughnut,
        title: title_for(ChartId::AqiCategories, city),
        dataset_label: "Readings".to_string(),
        data: ChartData::Categorical(histogram_points(histogram.chart_entries())),
    }
}

/// Pollution-level bars; every level is shown, including zeros.
pub fn distribution_chart(city: &str, histogram: &Histogram) -> ChartSpec {
    ChartSpec {
        id: ChartId::PollutionDistribution,
        kind: ChartKind::Bar,
        title: title_for(ChartId::PollutionDistribution, city),
        dataset_label: "Number of Readings".to_string(),
        data: ChartData::Categorical(histogram_points(histogram.entries())),
    }
}

/// The four charts of one session, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSet {
    charts: BTreeMap<ChartId, ChartSpec>,
}

impl ChartSet {
    /// Builds every chart from a session.
    pub fn build(session: &AnalyticsSession) -> Self {
        let city = session.city();
        let specs = [
            trend_chart(city, &session.time_series()),
            pollutants_chart(city, &session.pollutant_averages()),
            categories_chart(city, &session.categories()),
            distribution_chart(city, &session.distribution()),
        ];

        Self {
            charts: specs.into_iter().map(|spec| (spec.id, spec)).collect(),
        }
    }

    pub fn get(&self, id: ChartId) -> Option<&ChartSpec> {
        self.charts.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartSpec> {
        self.charts.values()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PollutantSnapshot, Reading};
    use chrono::{Duration, NaiveDate};

    fn sample_session() -> AnalyticsSession {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let readings = vec![
            Reading::new(start + Duration::hours(2), 310),
            Reading::new(start, 30).with_pollutants(PollutantSnapshot {
                pm25: Some(8.0),
                ..Default::default()
            }),
            Reading::new(start + Duration::hours(1), 120),
        ];

        AnalyticsSession::new("Pune", start, start + Duration::days(1), readings).unwrap()
    }

    #[test]
    fn test_chart_set_has_all_charts() {
        let charts = ChartSet::build(&sample_session());

        assert_eq!(charts.len(), 4);
        for id in ChartId::ALL {
            let chart = charts.get(id).unwrap();
            assert_eq!(chart.kind, id.kind());
            assert_eq!(chart.title, format!("{} - Pune", id.heading()));
        }
    }

    #[test]
    fn test_trend_chart_sorted_and_coloured() {
        let charts = ChartSet::build(&sample_session());
        let trend = charts.get(ChartId::AqiTrend).unwrap();

        let ChartData::TimeSeries(points) = &trend.data else {
            panic!("trend chart should carry a time series");
        };
        let values: Vec<i32> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![30, 120, 310]);
        assert_eq!(points[0].color, "#00ff88");
        assert_eq!(points[2].color, "#880000");
    }

    #[test]
    fn test_category_chart_omits_empty_buckets() {
        let charts = ChartSet::build(&sample_session());
        let pie = charts.get(ChartId::AqiCategories).unwrap();
        assert_eq!(pie.data.len(), 3);

        let dist = charts.get(ChartId::PollutionDistribution).unwrap();
        assert_eq!(dist.data.len(), 6);
    }

    #[test]
    fn test_pollutant_chart_values() {
        let charts = ChartSet::build(&sample_session());
        let bars = charts.get(ChartId::PollutantsBar).unwrap();

        let ChartData::Categorical(points) = &bars.data else {
            panic!("pollutant chart should be categorical");
        };
        assert_eq!(points[0].label, "PM2.5");
        assert_eq!(points[0].value, 8.0);
        assert_eq!(points[1].value, 0.0);
    }

    #[test]
    fn test_share_labels() {
        let charts = ChartSet::build(&sample_session());
        let pie = charts.get(ChartId::AqiCategories).unwrap();

        let labels = pie.share_labels();
        assert_eq!(labels[0], "Good (0-50): 1 (33.3%)");

        let trend = charts.get(ChartId::AqiTrend).unwrap();
        assert!(trend.share_labels().is_empty());
    }

    #[test]
    fn test_chart_json_shape() {
        let charts = ChartSet::build(&sample_session());
        let json = serde_json::to_value(charts.get(ChartId::AqiTrend).unwrap()).unwrap();

        assert_eq!(json["id"], "aqi-trend");
        assert_eq!(json["kind"], "line");
        assert_eq!(json["data"]["type"], "time_series");
        assert_eq!(json["data"]["points"].as_array().unwrap().len(), 3);
    }
}
