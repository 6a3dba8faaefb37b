//! City and date-range selection.
//!
//! Everything here is checked before a request leaves the machine.

use crate::error::SelectionError;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Which end of a range a date-only input stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Midnight at the start of the day.
    Start,
    /// The last second of the day.
    End,
}

/// Parse a user-supplied date or date-time.
pub fn parse_date_input(input: &str, bound: Bound) -> Result<NaiveDateTime, SelectionError> {
    let input = input.trim();

    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(parsed);
        }
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| SelectionError::InvalidDate(input.to_string()))?;

    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
    };
    Ok(date.and_time(time))
}

/// Limits applied when resolving a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeLimits {
    /// Quick-range length used when no dates are given.
    pub default_days: u32,
    /// Longest range the server accepts.
    pub max_range_days: u32,
}

impl Default for RangeLimits {
    fn default() -> Self {
        Self {
            default_days: 90,
            max_range_days: 1095,
        }
    }
}

/// A validated city and date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub city: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Selection {
    /// Resolve raw CLI input into a selection.
    ///
    /// With neither dates nor `days`, the default quick range ending at
    /// `now` is used. A single date on its own is an error.
    pub fn resolve(
        city: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
        days: Option<u32>,
        now: NaiveDateTime,
        limits: RangeLimits,
    ) -> Result<Self, SelectionError> {
        let city = city.map(str::trim).unwrap_or_default();
        if city.is_empty() {
            return Err(SelectionError::MissingCity);
        }

        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (
                parse_date_input(start, Bound::Start)?,
                parse_date_input(end, Bound::End)?,
            ),
            (Some(_), None) => return Err(SelectionError::MissingDate("end")),
            (None, Some(_)) => return Err(SelectionError::MissingDate("start")),
            (None, None) => {
                let days = days.unwrap_or(limits.default_days);
                if days > limits.max_range_days {
                    return Err(SelectionError::RangeTooLong {
                        days: i64::from(days),
                        max: i64::from(limits.max_range_days),
                    });
                }
                quick_range(now, days).ok_or(SelectionError::RangeTooLong {
                    days: i64::from(days),
                    max: i64::from(limits.max_range_days),
                })?
            }
        };

        let selection = Self {
            city: city.to_string(),
            start,
            end,
        };
        selection.check(limits)?;
        Ok(selection)
    }

    fn check(&self, limits: RangeLimits) -> Result<(), SelectionError> {
        if self.start >= self.end {
            return Err(SelectionError::InvertedRange {
                start: self.start,
                end: self.end,
            });
        }

        let days = self.days();
        if days > i64::from(limits.max_range_days) {
            return Err(SelectionError::RangeTooLong {
                days,
                max: i64::from(limits.max_range_days),
            });
        }

        Ok(())
    }

    /// Whole days spanned by the range.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// The `days`-long range ending at `now`, to the second.
///
/// `None` when the start would fall outside the representable dates.
pub fn quick_range(now: NaiveDateTime, days: u32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let end = now.with_nanosecond(0).unwrap_or(now);
    let start = end.checked_sub_signed(Duration::days(i64::from(days)))?;
    Some((start, end))
}
