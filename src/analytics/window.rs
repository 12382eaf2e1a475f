use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Utc, Weekday,
};
use serde::{Deserialize, Serialize};

use crate::models::mood_entry::MoodEntry;

/// Time-bucketing unit selected for analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    #[default]
    Week,
    Month,
    Year,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        };
        f.write_str(s)
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            "year" | "yearly" => Ok(Granularity::Year),
            other => Err(format!("Unknown granularity: {}", other)),
        }
    }
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CalendarError {
    #[error("No valid local midnight on {0}")]
    NoLocalMidnight(NaiveDate),

    #[error("Date out of range near {0}")]
    OutOfRange(NaiveDate),
}

/// Calendar-aware window arithmetic in one time zone with a configurable
/// first day of the week.
#[derive(Debug, Clone)]
pub struct DateBucketer<Tz: TimeZone> {
    tz: Tz,
    week_start: Weekday,
}

impl<Tz: TimeZone> DateBucketer<Tz> {
    pub fn new(tz: Tz, week_start: Weekday) -> Self {
        Self { tz, week_start }
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// Calendar day of `instant` in this zone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// First day of the week containing `date`.
    pub fn start_of_week(&self, date: NaiveDate) -> Option<NaiveDate> {
        let offset = (7 + date.weekday().num_days_from_sunday()
            - self.week_start.num_days_from_sunday())
            % 7;
        date.checked_sub_days(Days::new(offset as u64))
    }

    /// Local calendar dates bounding the bucket that contains `date`, end exclusive.
    pub fn date_range(
        &self,
        date: NaiveDate,
        granularity: Granularity,
    ) -> Option<(NaiveDate, NaiveDate)> {
        match granularity {
            Granularity::Day => Some((date, date.succ_opt()?)),
            Granularity::Week => {
                let start = self.start_of_week(date)?;
                Some((start, start.checked_add_days(Days::new(7))?))
            }
            Granularity::Month => {
                let start = date.with_day(1)?;
                Some((start, start.checked_add_months(Months::new(1))?))
            }
            Granularity::Year => Some((
                NaiveDate::from_ymd_opt(date.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)?,
            )),
        }
    }

    pub fn window_for(
        &self,
        reference: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<Window, CalendarError> {
        let date = self.local_date(reference);
        let (start, end) = self
            .date_range(date, granularity)
            .ok_or(CalendarError::OutOfRange(date))?;

        Ok(Window {
            start: self.local_midnight(start)?,
            end: self.local_midnight(end)?,
        })
    }

    /// 00:00 on `date` in this zone. Zones that skip midnight for DST resolve
    /// to the first instant after the gap.
    pub fn local_midnight(&self, date: NaiveDate) -> Result<DateTime<Utc>, CalendarError> {
        let midnight = date.and_time(NaiveTime::MIN);
        self.resolve_local(midnight)
            .or_else(|| {
                midnight
                    .checked_add_signed(Duration::hours(1))
                    .and_then(|later| self.resolve_local(later))
            })
            .ok_or(CalendarError::NoLocalMidnight(date))
    }

    pub fn contains(&self, entry: &MoodEntry, window: &Window) -> bool {
        window.contains(entry.timestamp)
    }

    /// Entries inside `window`, input order preserved.
    pub fn filter<'a>(&self, entries: &'a [MoodEntry], window: &Window) -> Vec<&'a MoodEntry> {
        entries
            .iter()
            .filter(|entry| self.contains(entry, window))
            .collect()
    }

    /// Moves `reference` by `step` units of `granularity`, keeping the local
    /// time of day. Month and year steps clamp to the end of shorter months.
    /// Returns `reference` unchanged when the arithmetic has no valid result.
    pub fn shift(
        &self,
        reference: DateTime<Utc>,
        granularity: Granularity,
        step: i32,
    ) -> DateTime<Utc> {
        match self.try_shift(reference, granularity, step) {
            Some(shifted) => shifted,
            None => {
                tracing::warn!(
                    %reference,
                    %granularity,
                    step,
                    "Calendar arithmetic failed, keeping reference date"
                );
                reference
            }
        }
    }

    fn try_shift(
        &self,
        reference: DateTime<Utc>,
        granularity: Granularity,
        step: i32,
    ) -> Option<DateTime<Utc>> {
        let local = reference.with_timezone(&self.tz).naive_local();
        let forward = step >= 0;
        let n = step.unsigned_abs();

        let shifted = match granularity {
            Granularity::Day => shift_days(local, u64::from(n), forward),
            Granularity::Week => shift_days(local, u64::from(n) * 7, forward),
            Granularity::Month => shift_months(local, n, forward),
            Granularity::Year => shift_months(local, n.checked_mul(12)?, forward),
        }?;

        self.resolve_local(shifted)
    }

    fn resolve_local(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }
}

fn shift_days(local: NaiveDateTime, days: u64, forward: bool) -> Option<NaiveDateTime> {
    if forward {
        local.checked_add_days(Days::new(days))
    } else {
        local.checked_sub_days(Days::new(days))
    }
}

fn shift_months(local: NaiveDateTime, months: u32, forward: bool) -> Option<NaiveDateTime> {
    if forward {
        local.checked_add_months(Months::new(months))
    } else {
        local.checked_sub_months(Months::new(months))
    }
}
