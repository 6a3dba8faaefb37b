//! Writing exported artifacts to disk.

use crate::charts::{render, ChartSet};
use crate::cli::ChartFormat;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Build `{artifact}-{city}-{YYYY-MM-DD}.{ext}`.
///
/// Path separators in the city are replaced so the name stays a single
/// path component.
pub fn artifact_file_name(artifact: &str, city: &str, date: NaiveDate, extension: &str) -> String {
    let city = city.trim().replace(['/', '\\'], "_");
    format!(
        "{}-{}-{}.{}",
        artifact,
        city,
        date.format("%Y-%m-%d"),
        extension
    )
}

/// Write `bytes` to `dir/name`, creating `dir` if needed.
pub fn write_artifact(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = dir.join(name);
    std::fs::write(&path, bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Render every chart in each image format of `format`. Returns the written paths.
pub fn write_charts(
    dir: &Path,
    charts: &ChartSet,
    city: &str,
    date: NaiveDate,
    format: ChartFormat,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for chart in charts.iter() {
        for image in format.images() {
            let name = artifact_file_name(chart.id.artifact(), city, date, image.extension());
            let path = dir.join(name);
            render::render_to_file(chart, &path, *image)?;
            debug!("Wrote chart {}", path.display());
            paths.push(path);
        }
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reading;
    use crate::session::AnalyticsSession;
    use chrono::Duration;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name("aqi-trend", "Delhi", date(), "png"),
            "aqi-trend-Delhi-2024-03-09.png"
        );
        assert_eq!(
            artifact_file_name("air-quality-data", "New York", date(), "csv"),
            "air-quality-data-New York-2024-03-09.csv"
        );
    }

    #[test]
    fn test_artifact_file_name_strips_separators() {
        assert_eq!(
            artifact_file_name("air-quality-report", "../etc\\x", date(), "pdf"),
            "air-quality-report-.._etc_x-2024-03-09.pdf"
        );
    }

    #[test]
    fn test_write_artifact_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("out");

        let path = write_artifact(&dir, "file.csv", b"a,b\n").unwrap();

        assert_eq!(path, dir.join("file.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n");
    }

    #[test]
    fn test_write_charts() {
        let tmp = TempDir::new().unwrap();
        let start = date().and_hms_opt(0, 0, 0).unwrap();
        let readings = vec![
            Reading::new(start, 45),
            Reading::new(start + Duration::hours(1), 160),
        ];
        let session =
            AnalyticsSession::new("Delhi", start, start + Duration::days(1), readings).unwrap();
        let charts = ChartSet::build(&session);

        let paths = write_charts(tmp.path(), &charts, "Delhi", date(), ChartFormat::Png).unwrap();

        assert_eq!(paths.len(), 4);
        for path in &paths {
            let bytes = std::fs::read(path).unwrap();
            assert_eq!(bytes[..4], [0x89, b'P', b'N', b'G']);
        }
        assert!(tmp.path().join("aqi-trend-Delhi-2024-03-09.png").exists());
        assert!(tmp.path().join("aqi-categories-Delhi-2024-03-09.png").exists());
        assert!(tmp
            .path()
            .join("pollution-distribution-Delhi-2024-03-09.png")
            .exists());
    }

    #[test]
    fn test_write_charts_both_formats() {
        let tmp = TempDir::new().unwrap();
        let start = date().and_hms_opt(0, 0, 0).unwrap();
        let session =
            AnalyticsSession::new("Delhi", start, start + Duration::days(1), vec![Reading::new(start, 80)])
                .unwrap();
        let charts = ChartSet::build(&session);
        let dir = tmp.path().join("charts");

        let paths = write_charts(&dir, &charts, "Delhi", date(), ChartFormat::Both).unwrap();

        assert_eq!(paths.len(), 8);
        let svg = std::fs::read_to_string(dir.join("pollutants-bar-Delhi-2024-03-09.svg")).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(dir.join("pollutants-bar-Delhi-2024-03-09.png").exists());
    }
}
