use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// One Saturday-to-Friday accounting week, identified by its Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Week {
    start: NaiveDate,
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "week of {}", self.start)
    }
}

impl Week {
    /// The week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        // Days elapsed since the most recent Saturday.
        let back = (date.weekday().num_days_from_sunday() + 1) % 7;
        Week {
            start: date - Duration::days(back as i64),
        }
    }

    pub fn start(self) -> NaiveDate {
        self.start
    }

    /// Friday of this week (inclusive end).
    pub fn end(self) -> NaiveDate {
        self.start + Duration::days(6)
    }

    /// Rent is due the Thursday before the Friday payout.
    pub fn due_date(self) -> NaiveDate {
        self.start + Duration::days(5)
    }

    pub fn next(self) -> Self {
        Week {
            start: self.start + Duration::days(7),
        }
    }

    pub fn range(self) -> DateRange {
        DateRange::new(self.start, self.end())
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        self.range().contains(date)
    }
}

/// Enumerate every week whose bucket intersects `window`, starting at the
/// week containing `window.start`.
pub fn weeks_in(window: DateRange) -> Vec<Week> {
    let mut weeks = Vec::new();
    let mut week = Week::containing(window.start);
    while week.start() <= window.end {
        weeks.push(week);
        week = week.next();
    }
    weeks
}

/// Civil calendar date of a UTC instant in the household's timezone.
/// Bucket membership is decided on this date, so week boundaries follow the
/// household's clock regardless of where the server runs.
pub fn local_date(ts: DateTime<Utc>, tz: Tz) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}
