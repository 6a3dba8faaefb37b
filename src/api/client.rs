//! HTTP client for the AirSight API.
//!
//! All calls are plain request/response; there are no retries. Failures
//! are classified into [`ApiError`] so the command layer can report them.

use crate::api::types::{
    CitiesResponse, DatabaseStatus, ErrorBody, ExportKind, ExportPayload, HistoricalData,
    HistoricalResponse, SeedResponse,
};
use crate::error::ApiError;
use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timestamp format the API expects for `startDate`/`endDate`.
const QUERY_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Connection settings for the API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Sent as the `Authorization` header.
    pub token: Option<String>,
    /// Sent as the `X-User-Id` header.
    pub user_id: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_seconds: 30,
            token: None,
            user_id: None,
        }
    }
}

impl From<&crate::config::ApiSettings> for ApiConfig {
    fn from(settings: &crate::config::ApiSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            timeout_seconds: settings.timeout_seconds,
            token: settings.token.clone(),
            user_id: settings.user_id.clone(),
        }
    }
}

/// Outcome of waiting for seeded data to appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedProgress {
    /// The database crossed the readiness threshold.
    Ready { total_records: u64 },
    /// Gave up after the configured number of checks.
    TimedOut { checks: u32 },
}

/// Client for the AirSight REST API.
pub struct AqiApiClient {
    config: ApiConfig,
    http_client: reqwest::Client,
}

impl AqiApiClient {
    /// Create a new client.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Builds `{base_url}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn with_user_id(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.user_id {
            Some(ref user_id) => request.header("X-User-Id", user_id),
            None => request,
        }
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        let request = self.with_user_id(request);
        match self.config.token {
            Some(ref token) => request.header("Authorization", token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        request.send().await.map_err(|e| {
            ApiError::from_reqwest(e, &self.config.base_url, self.config.timeout_seconds)
        })
    }

    /// Turns a non-success status into an error, preferring the server's message.
    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody {
                message: Some(message),
            }) => Err(ApiError::Rejected(message)),
            _ => Err(ApiError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check_status(self.send(request).await?).await?;
        let body = response.text().await.map_err(|e| {
            ApiError::from_reqwest(e, &self.config.base_url, self.config.timeout_seconds)
        })?;

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// List cities with data.
    pub async fn list_cities(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["aqi", "cities"])?;
        debug!("GET {}", url);

        let response: CitiesResponse = self.get_json(self.http_client.get(url)).await?;
        if !response.success {
            return Err(ApiError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Error loading cities list".to_string()),
            ));
        }

        Ok(response.cities)
    }

    /// Fetch historical readings for a city and date range.
    pub async fn fetch_historical(
        &self,
        city: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<HistoricalData, ApiError> {
        let url = self.endpoint(&["aqi", "historical", city])?;
        let start = start.format(QUERY_DATE_FORMAT).to_string();
        let end = end.format(QUERY_DATE_FORMAT).to_string();
        info!("Fetching historical data for {} ({} to {})", city, start, end);

        let request = self
            .http_client
            .get(url)
            .query(&[("startDate", start.as_str()), ("endDate", end.as_str())]);
        let response: HistoricalResponse = self.get_json(self.with_auth(request)).await?;

        if !response.success {
            return Err(ApiError::NoData(
                response
                    .message
                    .unwrap_or_else(|| "Unable to fetch historical data".to_string()),
            ));
        }

        let data = HistoricalData::from(response);
        debug!(
            "Received {} readings (sampled: {}, days covered: {})",
            data.readings.len(),
            data.was_sampled,
            data.days_covered
        );
        Ok(data)
    }

    async fn download(
        &self,
        kind: ExportKind,
        city: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&["export", kind.endpoint()])?;
        debug!("GET {}", url);

        let request = self
            .http_client
            .get(url)
            .query(&[("city", city), ("startDate", start), ("endDate", end)]);
        let request = match kind {
            ExportKind::AnalyticsPdf => self.with_auth(request),
            ExportKind::Csv | ExportKind::Pdf => self.with_user_id(request),
        };

        let response = Self::check_status(self.send(request).await?).await?;
        let bytes = response.bytes().await.map_err(|e| {
            ApiError::from_reqwest(e, &self.config.base_url, self.config.timeout_seconds)
        })?;

        Ok(bytes.to_vec())
    }

    /// Download a CSV or PDF export.
    ///
    /// The analytics PDF falls back to the plain PDF report when the
    /// server cannot produce it.
    pub async fn export(
        &self,
        kind: ExportKind,
        city: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<ExportPayload, ApiError> {
        let start = start.format(QUERY_DATE_FORMAT).to_string();
        let end = end.format(QUERY_DATE_FORMAT).to_string();

        match self.download(kind, city, &start, &end).await {
            Ok(bytes) => Ok(ExportPayload { kind, bytes }),
            Err(e) if kind == ExportKind::AnalyticsPdf => {
                warn!("Analytics PDF unavailable ({}), falling back to plain PDF", e);
                let bytes = self.download(ExportKind::Pdf, city, &start, &end).await?;
                Ok(ExportPayload {
                    kind: ExportKind::Pdf,
                    bytes,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Ask the server to generate `years` of historical sample data.
    pub async fn seed_historical_data(&self, years: u32) -> Result<SeedResponse, ApiError> {
        let url = self.endpoint(&["admin", "seed-historical-data"])?;
        info!("Requesting {} years of historical data", years);

        let request = self
            .http_client
            .post(url)
            .query(&[("years", years.to_string())]);
        let response: SeedResponse = self.get_json(request).await?;

        if !response.success {
            return Err(ApiError::Rejected(response.message.unwrap_or_else(|| {
                "Failed to start historical data generation".to_string()
            })));
        }

        Ok(response)
    }

    /// Record count and cities available on the server.
    pub async fn database_status(&self) -> Result<DatabaseStatus, ApiError> {
        let url = self.endpoint(&["admin", "database-status"])?;
        debug!("GET {}", url);

        self.get_json(self.http_client.get(url)).await
    }

    /// Poll the database status until it holds more than `threshold` records.
    ///
    /// Failed status checks are logged and polling continues.
    pub async fn wait_for_seed(
        &self,
        poll_interval: Duration,
        max_checks: u32,
        threshold: u64,
        show_progress: bool,
    ) -> SeedProgress {
        let spinner = if show_progress {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(120));
            pb.set_message("Waiting for historical data generation...");
            Some(pb)
        } else {
            None
        };

        let mut outcome = SeedProgress::TimedOut { checks: max_checks };

        for check in 1..=max_checks {
            tokio::time::sleep(poll_interval).await;

            match self.database_status().await {
                Ok(status) if status.success && status.total_records > threshold => {
                    outcome = SeedProgress::Ready {
                        total_records: status.total_records,
                    };
                    break;
                }
                Ok(status) => {
                    debug!(
                        "Check {}/{}: {} records so far",
                        check, max_checks, status.total_records
                    );
                    if let Some(ref pb) = spinner {
                        pb.set_message(format!(
                            "Waiting for historical data generation... {} records ({}/{})",
                            status.total_records, check, max_checks
                        ));
                    }
                }
                Err(e) => debug!("Check {}/{} failed: {}", check, max_checks, e),
            }
        }

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::{json, serve, Canned};
    use chrono::NaiveDate;

    fn client(base_url: String) -> AqiApiClient {
        AqiApiClient::new(ApiConfig {
            base_url,
            timeout_seconds: 5,
            token: Some("Bearer abc".to_string()),
            user_id: Some("42".to_string()),
        })
        .unwrap()
    }

    fn range() -> (NaiveDateTime, NaiveDateTime) {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (
            day.and_hms_opt(0, 0, 0).unwrap(),
            day.and_hms_opt(12, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_invalid_base_url() {
        let result = AqiApiClient::new(ApiConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_endpoint_encodes_city() {
        let client = client("http://localhost:8080/api/".to_string());
        let url = client.endpoint(&["aqi", "historical", "New Delhi"]).unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/aqi/historical/New%20Delhi"
        );
    }

    #[tokio::test]
    async fn test_list_cities() {
        let (base, server) = serve(vec![json(
            200,
            r#"{"success": true, "cities": ["Delhi", "Mumbai"], "count": 2}"#,
        )])
        .await;

        let cities = client(base).list_cities().await;
        tokio_test::assert_ok!(&cities);
        assert_eq!(cities.unwrap(), vec!["Delhi", "Mumbai"]);

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /api/aqi/cities "));
    }

    #[tokio::test]
    async fn test_fetch_historical_sends_auth_and_dates() {
        let body = r#"{
            "success": true,
            "data": [
                {"timestamp": "2024-01-01T02:00:00", "aqiValue": 120, "pm25": 40.0},
                {"timestamp": "2024-01-01T01:00:00", "aqiValue": 30}
            ],
            "wasSampled": true,
            "daysCovered": 400
        }"#;
        let (base, server) = serve(vec![json(200, body)]).await;
        let (start, end) = range();

        let data = client(base)
            .fetch_historical("New Delhi", start, end)
            .await
            .unwrap();

        assert_eq!(data.readings.len(), 2);
        assert_eq!(data.readings[0].aqi_value, 120);
        assert!(data.was_sampled);
        assert_eq!(data.days_covered, 400);

        let request = server.await.unwrap().remove(0).to_lowercase();
        assert!(request.starts_with("get /api/aqi/historical/new%20delhi?"));
        assert!(request.contains("startdate=2024-01-01t00%3a00%3a00"));
        assert!(request.contains("enddate=2024-01-01t12%3a30%3a00"));
        assert!(request.contains("authorization: bearer abc"));
        assert!(request.contains("x-user-id: 42"));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_rejected() {
        let (base, _server) = serve(vec![json(
            401,
            r#"{"success": false, "message": "Authentication required", "requiresAuth": true}"#,
        )])
        .await;
        let (start, end) = range();

        let err = client(base)
            .fetch_historical("Delhi", start, end)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Authentication required"));
    }

    #[tokio::test]
    async fn test_server_error_without_json() {
        let (base, _server) = serve(vec![Canned {
            status: 500,
            content_type: "text/plain",
            body: "boom".to_string(),
        }])
        .await;

        let err = client(base).list_cities().await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, ref body } if body == "boom"));
    }

    #[tokio::test]
    async fn test_unsuccessful_body_is_no_data() {
        let (base, _server) = serve(vec![json(
            200,
            r#"{"success": false, "message": "Date range cannot exceed 3 years (1095 days)"}"#,
        )])
        .await;
        let (start, end) = range();

        let err = client(base)
            .fetch_historical("Delhi", start, end)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NoData(ref m) if m.contains("1095 days")));
    }

    #[tokio::test]
    async fn test_analytics_pdf_falls_back_to_plain_pdf() {
        let (base, server) = serve(vec![
            Canned {
                status: 404,
                content_type: "text/plain",
                body: "not found".to_string(),
            },
            Canned {
                status: 200,
                content_type: "application/pdf",
                body: "%PDF-1.4".to_string(),
            },
        ])
        .await;
        let (start, end) = range();

        let payload = client(base)
            .export(ExportKind::AnalyticsPdf, "Delhi", start, end)
            .await
            .unwrap();

        assert_eq!(payload.kind, ExportKind::Pdf);
        assert_eq!(payload.bytes, b"%PDF-1.4".to_vec());

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /api/export/analytics-pdf?"));
        assert!(requests[1].starts_with("GET /api/export/pdf?"));
        assert!(!requests[1].to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_csv_export() {
        let (base, _server) = serve(vec![Canned {
            status: 200,
            content_type: "text/csv",
            body: "timestamp,aqi\n".to_string(),
        }])
        .await;
        let (start, end) = range();

        let payload = client(base)
            .export(ExportKind::Csv, "Delhi", start, end)
            .await
            .unwrap();

        assert_eq!(payload.kind, ExportKind::Csv);
        assert_eq!(payload.bytes, b"timestamp,aqi\n".to_vec());
    }

    #[tokio::test]
    async fn test_seed_and_status() {
        let (base, server) = serve(vec![
            json(200, r#"{"success": true, "message": "started"}"#),
            json(
                200,
                r#"{"success": true, "totalRecords": 12, "availableCities": []}"#,
            ),
        ])
        .await;
        let client = client(base);

        let seed = client.seed_historical_data(3).await.unwrap();
        assert_eq!(seed.message.as_deref(), Some("started"));

        let status = client.database_status().await.unwrap();
        assert_eq!(status.total_records, 12);

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/admin/seed-historical-data?years=3 "));
        assert!(requests[1].starts_with("GET /api/admin/database-status "));
    }

    #[tokio::test]
    async fn test_wait_for_seed_until_ready() {
        let (base, _server) = serve(vec![
            json(200, r#"{"success": true, "totalRecords": 10}"#),
            json(200, r#"{"success": true, "totalRecords": 5000}"#),
        ])
        .await;

        let progress = client(base)
            .wait_for_seed(Duration::from_millis(10), 5, 1000, false)
            .await;

        assert_eq!(
            progress,
            SeedProgress::Ready {
                total_records: 5000
            }
        );
    }

    #[tokio::test]
    async fn test_wait_for_seed_times_out() {
        let (base, _server) = serve(vec![
            json(200, r#"{"success": true, "totalRecords": 10}"#),
            json(200, r#"{"success": true, "totalRecords": 20}"#),
        ])
        .await;

        let progress = client(base)
            .wait_for_seed(Duration::from_millis(10), 2, 1000, false)
            .await;

        assert_eq!(progress, SeedProgress::TimedOut { checks: 2 });
    }
}
