//! Markdown report generation.
//!
//! Turns an analytics session into an [`AnalyticsReport`] and renders it
//! as Markdown or JSON.

use crate::analysis::{percentages, HistogramEntry};
use crate::aqi::AqiCategory;
use crate::error::AnalyticsError;
use crate::models::{AnalyticsReport, PollutantAverage, ReportMetadata, SummaryStats};
use crate::session::AnalyticsSession;
use anyhow::Result;

/// Assemble the report for a session.
pub fn build_report(
    session: &AnalyticsSession,
    metadata: ReportMetadata,
    chart_files: Vec<String>,
) -> Result<AnalyticsReport, AnalyticsError> {
    Ok(AnalyticsReport {
        metadata,
        summary: session.summary()?,
        categories: session.categories().entries(),
        distribution: session.distribution().entries(),
        pollutant_averages: session.pollutant_averages(),
        chart_files,
    })
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalyticsReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "# AirSight Analytics Report: {}\n\n",
        report.metadata.city
    ));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_histogram_section(
        "AQI Categories",
        "Category",
        &report.categories,
    ));
    output.push_str(&generate_histogram_section(
        "Pollution Distribution",
        "Level",
        &report.distribution,
    ));
    output.push_str(&generate_pollutants_section(&report.pollutant_averages));
    output.push_str(&generate_charts_section(&report.chart_files));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **City:** {}\n", metadata.city));
    section.push_str(&format!(
        "- **Period:** {} to {}\n",
        metadata.start.format("%Y-%m-%d %H:%M"),
        metadata.end.format("%Y-%m-%d %H:%M")
    ));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Data Source:** {}\n", metadata.api_url));
    if metadata.was_sampled {
        section.push_str(&format!(
            "- **Sampling:** data was sampled by the server ({} days covered)\n",
            metadata.days_covered
        ));
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the summary statistics section.
fn generate_summary_section(summary: &SummaryStats) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Readings | Average AQI | Maximum AQI | Minimum AQI |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {:.2} | {} {} | {} {} |\n\n",
        summary.count,
        summary.average,
        AqiCategory::from_aqi(summary.maximum).emoji(),
        summary.maximum,
        AqiCategory::from_aqi(summary.minimum).emoji(),
        summary.minimum,
    ));
    section.push_str(&format!(
        "Average air quality: **{}**\n\n",
        AqiCategory::from_aqi(summary.average.round() as i32)
    ));

    section
}

/// Generate a bucket table with counts and shares.
fn generate_histogram_section(title: &str, column: &str, entries: &[HistogramEntry]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    section.push_str(&format!("| {} | Readings | Share |\n", column));
    section.push_str("|:---|:---:|:---:|\n");

    let counts: Vec<usize> = entries.iter().map(|e| e.count).collect();
    for (entry, share) in entries.iter().zip(percentages(&counts)) {
        section.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            entry.label, entry.count, share
        ));
    }
    section.push('\n');

    section
}

/// Generate the pollutant averages section.
fn generate_pollutants_section(averages: &[PollutantAverage]) -> String {
    if averages.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Average Pollutant Levels\n\n");
    section.push_str("| Pollutant | Average | Unit |\n");
    section.push_str("|:---|:---:|:---:|\n");

    for avg in averages {
        section.push_str(&format!(
            "| {} | {:.2} | {} |\n",
            avg.label, avg.average, avg.unit
        ));
    }
    section.push('\n');

    section
}

/// Generate the list of chart files.
fn generate_charts_section(chart_files: &[String]) -> String {
    if chart_files.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Charts\n\n");
    for file in chart_files {
        section.push_str(&format!("- [{}]({})\n", file, file));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by AirSight v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalyticsReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reading;
    use chrono::{Duration, NaiveDate, Utc};

    fn create_test_metadata() -> ReportMetadata {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        ReportMetadata {
            city: "Delhi".to_string(),
            start,
            end: start + Duration::days(7),
            generated_at: Utc::now(),
            api_url: "http://localhost:8080/api".to_string(),
            was_sampled: false,
            days_covered: 7,
            duration_seconds: 1.5,
        }
    }

    fn create_test_report() -> AnalyticsReport {
        let metadata = create_test_metadata();
        let readings = vec![
            Reading::new(metadata.start, 30),
            Reading::new(metadata.start + Duration::hours(1), 120),
            Reading::new(metadata.start + Duration::hours(2), 310),
        ];
        let session =
            AnalyticsSession::new("Delhi", metadata.start, metadata.end, readings).unwrap();

        build_report(
            &session,
            metadata,
            vec!["aqi-trend-Delhi-2024-01-08.png".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_build_report() {
        let report = create_test_report();

        assert_eq!(report.summary.count, 3);
        assert_eq!(report.categories.len(), 6);
        assert_eq!(report.distribution.len(), 6);
        assert_eq!(report.pollutant_averages.len(), 6);
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# AirSight Analytics Report: Delhi"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("| 3 | 153.33 |"));
        assert!(markdown.contains("## AQI Categories"));
        assert!(markdown.contains("| Good (0-50) | 1 | 33.3% |"));
        assert!(markdown.contains("| Moderate (51-100) | 0 | 0.0% |"));
        assert!(markdown.contains("## Pollution Distribution"));
        assert!(markdown.contains("| Extreme (301+) | 1 | 33.3% |"));
        assert!(markdown.contains("## Average Pollutant Levels"));
        assert!(markdown.contains("aqi-trend-Delhi-2024-01-08.png"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let mut metadata = create_test_metadata();

        let section = generate_metadata_section(&metadata);
        assert!(section.contains("Delhi"));
        assert!(section.contains("2024-01-01 00:00 to 2024-01-08 00:00"));
        assert!(!section.contains("Sampling"));

        metadata.was_sampled = true;
        metadata.days_covered = 400;
        let section = generate_metadata_section(&metadata);
        assert!(section.contains("400 days covered"));
    }

    #[test]
    fn test_charts_section_omitted_without_files() {
        assert!(generate_charts_section(&[]).is_empty());
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"categories\""));
        assert!(json.contains("\"pollutant_averages\""));
    }
}
