//! Analytics sessions and the request-generation guard.
//!
//! A session is the immutable working set for one city and date range.
//! [`SessionManager`] owns the active session together with its charts and
//! only lets the most recently issued request replace them.

use crate::analysis::{self, CategoryHistogram, Histogram};
use crate::charts::ChartSet;
use crate::error::AnalyticsError;
use crate::models::{PollutantAverage, Reading, SummaryStats, TimeSeriesPoint};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

/// The in-memory working set for one city + date-range view.
#[derive(Debug, Clone)]
pub struct AnalyticsSession {
    city: String,
    start: NaiveDateTime,
    end: NaiveDateTime,
    readings: Vec<Reading>,
    was_sampled: bool,
    days_covered: i64,
}

impl AnalyticsSession {
    /// Creates a session. Sessions always hold at least one reading.
    pub fn new(
        city: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        readings: Vec<Reading>,
    ) -> Result<Self, AnalyticsError> {
        if readings.is_empty() {
            return Err(AnalyticsError::EmptyInput);
        }

        Ok(Self {
            city: city.into(),
            start,
            end,
            readings,
            was_sampled: false,
            days_covered: 0,
        })
    }

    /// Records the server's down-sampling information.
    pub fn with_sampling(mut self, was_sampled: bool, days_covered: i64) -> Self {
        self.was_sampled = was_sampled;
        self.days_covered = days_covered;
        self
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn was_sampled(&self) -> bool {
        self.was_sampled
    }

    pub fn days_covered(&self) -> i64 {
        self.days_covered
    }

    pub fn summary(&self) -> Result<SummaryStats, AnalyticsError> {
        analysis::compute_summary(&self.readings)
    }

    pub fn categories(&self) -> CategoryHistogram {
        analysis::categorize(&self.readings)
    }

    pub fn distribution(&self) -> Histogram {
        analysis::distribution(&self.readings)
    }

    pub fn pollutant_averages(&self) -> Vec<PollutantAverage> {
        analysis::pollutant_averages(&self.readings)
    }

    pub fn time_series(&self) -> Vec<TimeSeriesPoint> {
        analysis::to_time_series(&self.readings)
    }
}

/// Identifies one fetch request. Only the newest ticket may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of trying to install a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The session and its charts are now active.
    Applied { generation: u64 },
    /// A newer request was issued; the session was discarded.
    Stale { generation: u64, latest: u64 },
}

/// The active session and the charts built from it.
#[derive(Debug)]
pub struct ActiveSession {
    pub session: AnalyticsSession,
    pub charts: ChartSet,
    generation: u64,
}

impl ActiveSession {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Owns the active session and guards it against stale fetches.
#[derive(Debug, Default)]
pub struct SessionManager {
    latest_generation: u64,
    active: Option<ActiveSession>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket for a new fetch, superseding all earlier ones.
    pub fn begin_request(&mut self) -> RequestTicket {
        self.latest_generation += 1;
        debug!("Issued request generation {}", self.latest_generation);
        RequestTicket {
            generation: self.latest_generation,
        }
    }

    /// True if no newer request has been issued since `ticket`.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.generation == self.latest_generation
    }

    /// Installs `session` and rebuilds every chart, unless `ticket` is stale.
    pub fn commit(&mut self, ticket: RequestTicket, session: AnalyticsSession) -> CommitOutcome {
        if !self.is_current(ticket) {
            warn!(
                "Discarding stale result for {} (generation {}, latest {})",
                session.city(),
                ticket.generation,
                self.latest_generation
            );
            return CommitOutcome::Stale {
                generation: ticket.generation,
                latest: self.latest_generation,
            };
        }

        let charts = ChartSet::build(&session);
        self.active = Some(ActiveSession {
            session,
            charts,
            generation: ticket.generation,
        });

        CommitOutcome::Applied {
            generation: ticket.generation,
        }
    }

    /// Drops the active session if `ticket` is still current.
    ///
    /// Used when the latest request failed or returned no data.
    pub fn abandon(&mut self, ticket: RequestTicket) {
        if self.is_current(ticket) {
            self.clear();
        }
    }

    /// Returns to the pre-fetch state.
    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartId;
    use chrono::{Duration, NaiveDate};

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn session(city: &str, aqis: &[i32]) -> AnalyticsSession {
        let readings = aqis
            .iter()
            .enumerate()
            .map(|(i, &aqi)| Reading::new(base_time() + Duration::hours(i as i64), aqi))
            .collect();

        AnalyticsSession::new(city, base_time(), base_time() + Duration::days(1), readings).unwrap()
    }

    #[test]
    fn test_session_rejects_empty_readings() {
        let result = AnalyticsSession::new("Delhi", base_time(), base_time(), Vec::new());
        assert_eq!(result.unwrap_err(), AnalyticsError::EmptyInput);
    }

    #[test]
    fn test_session_views() {
        let session = session("Delhi", &[30, 120, 310]).with_sampling(true, 400);

        assert_eq!(session.city(), "Delhi");
        assert!(session.was_sampled());
        assert_eq!(session.days_covered(), 400);
        assert_eq!(session.summary().unwrap().average, 153.33);
        assert_eq!(session.categories().total(), 3);
        assert_eq!(session.distribution().total(), 3);
        assert_eq!(session.pollutant_averages().len(), 6);
        assert_eq!(session.time_series().len(), 3);
    }

    #[test]
    fn test_commit_latest_request() {
        let mut manager = SessionManager::new();
        assert!(manager.active().is_none());

        let ticket = manager.begin_request();
        let outcome = manager.commit(ticket, session("Delhi", &[42]));

        assert_eq!(outcome, CommitOutcome::Applied { generation: 1 });
        let active = manager.active().unwrap();
        assert_eq!(active.session.city(), "Delhi");
        assert_eq!(active.generation(), 1);
        assert_eq!(active.charts.len(), 4);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut manager = SessionManager::new();

        let first = manager.begin_request();
        let second = manager.begin_request();

        assert_eq!(
            manager.commit(second, session("Mumbai", &[80])),
            CommitOutcome::Applied { generation: 2 }
        );

        // The slower, older fetch resolves last and must not win.
        assert_eq!(
            manager.commit(first, session("Delhi", &[300])),
            CommitOutcome::Stale {
                generation: 1,
                latest: 2
            }
        );

        let active = manager.active().unwrap();
        assert_eq!(active.session.city(), "Mumbai");
        let trend = active.charts.get(ChartId::AqiTrend).unwrap();
        assert!(trend.title.ends_with("Mumbai"));
    }

    #[test]
    fn test_stale_before_newer_commit() {
        let mut manager = SessionManager::new();

        let first = manager.begin_request();
        let _second = manager.begin_request();

        assert!(!manager.is_current(first));
        assert!(matches!(
            manager.commit(first, session("Delhi", &[10])),
            CommitOutcome::Stale { .. }
        ));
        assert!(manager.active().is_none());
    }

    #[test]
    fn test_abandon_only_clears_for_current_ticket() {
        let mut manager = SessionManager::new();

        let first = manager.begin_request();
        manager.commit(first, session("Delhi", &[10]));

        let second = manager.begin_request();
        manager.abandon(first);
        assert!(manager.active().is_some());

        manager.abandon(second);
        assert!(manager.active().is_none());
        assert_eq!(manager.latest_generation(), 2);
    }
}
