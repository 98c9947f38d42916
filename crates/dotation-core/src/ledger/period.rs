//! Reporting periods (ISO week starting Monday, calendar month).

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Week,
    Month,
}

impl std::str::FromStr for PeriodKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" | "semaine" => Ok(PeriodKind::Week),
            "month" | "mois" => Ok(PeriodKind::Month),
            other => Err(format!("unknown period: {}", other)),
        }
    }
}

/// A half-open range of calendar days `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    pub kind: PeriodKind,
    pub start: NaiveDate,
    /// First day after the period
    pub end: NaiveDate,
}

impl Period {
    /// The week or month containing `date`.
    pub fn containing(kind: PeriodKind, date: NaiveDate) -> Self {
        match kind {
            PeriodKind::Week => {
                let start = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
                Self {
                    kind,
                    start,
                    end: start + Duration::days(7),
                }
            }
            PeriodKind::Month => {
                let start = date.with_day(1).unwrap_or(date);
                let end = if start.month() == 12 {
                    NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
                }
                .unwrap_or(start + Duration::days(31));
                Self { kind, start, end }
            }
        }
    }

    /// Last day included in the period.
    pub fn last_day(&self) -> NaiveDate {
        self.end - Duration::days(1)
    }

    /// Period bounds as epoch milliseconds, midnight in the given time zone.
    pub fn bounds_millis<Tz: TimeZone>(&self, tz: &Tz) -> (i64, i64) {
        (local_midnight_millis(tz, self.start), local_midnight_millis(tz, self.end))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Période : {} → {}",
            self.start.format("%Y-%m-%d"),
            self.last_day().format("%Y-%m-%d")
        )
    }
}

/// Epoch millis of local midnight; DST gaps fall back to the UTC instant.
fn local_midnight_millis<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}
