//! Command flows behind each CLI mode.
//!
//! Each command returns its exit code: 0 on success, 2 when the selected
//! range has no data. Errors propagate and end the process with code 1.

use crate::api::{AqiApiClient, ExportKind, ExportPayload, SeedProgress};
use crate::aqi::AqiCategory;
use crate::cli::{Args, OutputFormat};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::ReportMetadata;
use crate::selection::Selection;
use crate::session::{AnalyticsSession, SessionManager};
use crate::{export, report};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fetch, aggregate, and export analytics for one city and range.
///
/// Nothing is written to the output directory unless the fetch and every
/// requested download succeed.
pub async fn run_analytics(args: &Args, config: &Config, client: &AqiApiClient) -> Result<i32> {
    let start_time = Instant::now();
    let now = Utc::now();

    let selection = Selection::resolve(
        args.city.as_deref(),
        args.start.as_deref(),
        args.end.as_deref(),
        args.days,
        now.naive_utc(),
        config.analytics.limits(),
    )?;

    if config.api.token.is_none() {
        warn!("No API token configured; historical data requires login");
    }

    println!(
        "📥 Fetching historical data for {} ({} to {})",
        selection.city,
        selection.start.format("%Y-%m-%d %H:%M"),
        selection.end.format("%Y-%m-%d %H:%M")
    );

    let mut sessions = SessionManager::new();
    let ticket = sessions.begin_request();

    let data = match client
        .fetch_historical(&selection.city, selection.start, selection.end)
        .await
    {
        Ok(data) => data,
        Err(ApiError::NoData(message)) => {
            sessions.abandon(ticket);
            warn!("Server reported no data: {}", message);
            return handle_no_data(client, config, &selection).await;
        }
        Err(e) => {
            sessions.abandon(ticket);
            print_no_data_reasons(&selection);
            return Err(e).context("Error fetching historical data");
        }
    };

    if data.readings.is_empty() {
        sessions.abandon(ticket);
        return handle_no_data(client, config, &selection).await;
    }

    info!("Loaded {} readings", data.readings.len());
    let session = AnalyticsSession::new(
        selection.city.clone(),
        selection.start,
        selection.end,
        data.readings,
    )?
    .with_sampling(data.was_sampled, data.days_covered);

    // One request per invocation, so the ticket is still current here.
    sessions.commit(ticket, session);
    let active = sessions
        .active()
        .context("No active analytics session after commit")?;
    let session = &active.session;
    debug!(
        "Session generation {} holds {} readings",
        active.generation(),
        session.readings().len()
    );
    let summary = session.summary()?;

    // Download everything before touching the output directory so a
    // failed request leaves no partial artifacts behind.
    let (csv, pdf) = futures::join!(
        download_if(client, args.csv, ExportKind::Csv, &selection),
        download_if(client, args.pdf, ExportKind::AnalyticsPdf, &selection),
    );
    let downloads: Vec<ExportPayload> = [
        csv.context("Error exporting CSV")?,
        pdf.context("Error exporting PDF")?,
    ]
    .into_iter()
    .flatten()
    .collect();

    println!("\n📝 Writing artifacts...");
    let output_dir = &config.general.output_dir;
    let date = now.date_naive();

    let mut chart_files = Vec::new();
    if config.analytics.charts {
        let paths = export::write_charts(
            output_dir,
            &active.charts,
            session.city(),
            date,
            config.analytics.chart_format,
        )?;
        for path in &paths {
            println!("   📈 {}", path.display());
        }
        chart_files = paths
            .iter()
            .filter_map(|p| p.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect();
    }

    for payload in &downloads {
        let name = export::artifact_file_name(
            payload.kind.artifact(),
            session.city(),
            date,
            payload.kind.extension(),
        );
        let path = export::write_artifact(output_dir, &name, &payload.bytes)?;
        println!("   📄 {}", path.display());
    }

    let metadata = ReportMetadata {
        city: session.city().to_string(),
        start: session.start(),
        end: session.end(),
        generated_at: now,
        api_url: client.base_url().to_string(),
        was_sampled: session.was_sampled(),
        days_covered: session.days_covered(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let analytics_report = report::build_report(session, metadata, chart_files)?;

    let format = config.general.format;
    let output = match format {
        OutputFormat::Json => report::generate_json_report(&analytics_report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&analytics_report),
    };
    let report_path = write_summary(output_dir, session.city(), date, format, &output)?;

    // Print summary
    println!("\n📊 Analytics Summary for {}:", session.city());
    println!("   Readings: {}", summary.count);
    println!(
        "   Average AQI: {:.2} ({})",
        summary.average,
        AqiCategory::from_aqi(summary.average.round() as i32)
    );
    println!(
        "   Maximum AQI: {} {}",
        AqiCategory::from_aqi(summary.maximum).emoji(),
        summary.maximum
    );
    println!(
        "   Minimum AQI: {} {}",
        AqiCategory::from_aqi(summary.minimum).emoji(),
        summary.minimum
    );
    if !analytics_report.chart_files.is_empty() {
        println!("   Charts: {}", analytics_report.chart_files.len());
    }

    let mut message = format!("\n✅ Analytics updated for {}", session.city());
    if session.was_sampled() {
        message.push_str(&format!(
            " (data sampled for performance, {} days covered)",
            session.days_covered()
        ));
    }
    println!("{}", message);
    println!("   Report saved to: {}", report_path.display());

    Ok(0)
}

async fn download_if(
    client: &AqiApiClient,
    wanted: bool,
    kind: ExportKind,
    selection: &Selection,
) -> Result<Option<ExportPayload>, ApiError> {
    if !wanted {
        return Ok(None);
    }

    println!("⬇️  Downloading {}...", kind.artifact());
    client
        .export(kind, &selection.city, selection.start, selection.end)
        .await
        .map(Some)
}

fn write_summary(
    dir: &Path,
    city: &str,
    date: NaiveDate,
    format: OutputFormat,
    content: &str,
) -> Result<PathBuf> {
    let name = export::artifact_file_name("air-quality-summary", city, date, format.extension());
    export::write_artifact(dir, &name, content.as_bytes())
}

fn print_no_data_reasons(selection: &Selection) {
    println!("\n⚠️  No Data Available");
    println!(
        "   No historical readings for {} between {} and {}.",
        selection.city,
        selection.start.format("%Y-%m-%d %H:%M"),
        selection.end.format("%Y-%m-%d %H:%M")
    );
    println!("   Possible reasons:");
    println!("     - The date range is outside the collected data");
    println!("     - The city has no monitoring data yet");
    println!("     - The historical database has not been populated");
}

/// Explain an empty result and check whether the database needs seeding.
async fn handle_no_data(
    client: &AqiApiClient,
    config: &Config,
    selection: &Selection,
) -> Result<i32> {
    print_no_data_reasons(selection);

    match client.database_status().await {
        Ok(status) if status.needs_seeding(config.seed.ready_threshold) => {
            println!(
                "\n💡 The database only holds {} records. Generate sample data with:",
                status.total_records
            );
            println!("     airsight --seed --years {} --wait", config.seed.years);
        }
        Ok(status) if status.success => {
            println!(
                "\n   The database holds {} records; try another range or city.",
                status.total_records
            );
            if !status.available_cities.is_empty() {
                println!("   Cities with data: {}", status.available_cities.join(", "));
            }
        }
        Ok(_) => warn!("Database status check was not successful"),
        Err(e) => warn!("Could not check database status: {}", e),
    }

    Ok(2)
}

/// List cities with data, alongside the database record count.
pub async fn run_list_cities(client: &AqiApiClient) -> Result<i32> {
    let (cities, status) = futures::join!(client.list_cities(), client.database_status());
    let cities = cities.context("Error loading cities list")?;

    if cities.is_empty() {
        println!("No cities with data yet.");
    } else {
        println!("🏙️  Cities ({}):", cities.len());
        for city in &cities {
            println!("   - {}", city);
        }
    }

    match status {
        Ok(status) => println!("\n   Total records: {}", status.total_records),
        Err(e) => debug!("Database status unavailable: {}", e),
    }

    Ok(0)
}

/// Print the database status.
pub async fn run_status(client: &AqiApiClient, config: &Config) -> Result<i32> {
    let status = client
        .database_status()
        .await
        .context("Error checking database status")?;

    println!("🗄️  Database status ({})", client.base_url());
    println!("   Total records: {}", status.total_records);
    if status.available_cities.is_empty() {
        println!("   Cities with data: none");
    } else {
        println!(
            "   Cities with data: {}",
            status.available_cities.join(", ")
        );
    }

    if status.needs_seeding(config.seed.ready_threshold) {
        println!("\n💡 Little historical data available. Run `airsight --seed --wait` to generate some.");
    }

    Ok(0)
}

/// Start historical data generation, optionally waiting for it to finish.
pub async fn run_seed(
    client: &AqiApiClient,
    config: &Config,
    wait: bool,
    show_progress: bool,
) -> Result<i32> {
    println!(
        "🌱 Requesting {} years of historical data...",
        config.seed.years
    );

    let response = client
        .seed_historical_data(config.seed.years)
        .await
        .context("Failed to start historical data generation")?;

    println!(
        "   {}",
        response
            .message
            .as_deref()
            .unwrap_or("Historical data generation started")
    );

    if !wait {
        println!("   Check progress with `airsight --status`.");
        return Ok(0);
    }

    let progress = client
        .wait_for_seed(
            config.seed.poll_interval(),
            config.seed.max_checks,
            config.seed.ready_threshold,
            show_progress,
        )
        .await;

    match progress {
        SeedProgress::Ready { total_records } => {
            println!(
                "\n✅ Historical data ready: {} records available.",
                total_records
            );
            Ok(0)
        }
        SeedProgress::TimedOut { checks } => {
            eprintln!(
                "\n⚠️  Data generation is taking longer than expected ({} checks). Check again later with `airsight --status`.",
                checks
            );
            Ok(1)
        }
    }
}
