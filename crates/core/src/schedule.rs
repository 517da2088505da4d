use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::money::Money;
use super::people::FlatmateId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub i64);

#[derive(Debug, Clone, Error)]
pub enum ScheduleError {
    #[error("Schedule end date {end} must be after start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// A dated interval during which a flatmate owes a fixed weekly amount.
/// Intervals for the same flatmate may overlap; overlap is resolved at read
/// time by [`resolve_rate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSchedule {
    pub id: ScheduleId,
    pub flatmate_id: FlatmateId,
    /// Inclusive.
    pub start: NaiveDate,
    /// Inclusive; `None` = ongoing.
    pub end: Option<NaiveDate>,
    pub weekly_rate: Money,
    pub note: Option<String>,
}

impl PaymentSchedule {
    /// Validating constructor; the write boundary for the end-after-start
    /// invariant. Readers (the obligation calculator included) assume it.
    pub fn new(
        id: ScheduleId,
        flatmate_id: FlatmateId,
        start: NaiveDate,
        end: Option<NaiveDate>,
        weekly_rate: Money,
        note: Option<String>,
    ) -> Result<Self, ScheduleError> {
        if let Some(end) = end {
            if end <= start {
                return Err(ScheduleError::EndBeforeStart { start, end });
            }
        }
        Ok(PaymentSchedule {
            id,
            flatmate_id,
            start,
            end,
            weekly_rate,
            note,
        })
    }

    /// Day-granularity containment test.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.is_none_or(|end| date <= end)
    }
}

/// Pick the schedule applicable on `date`: among all covering schedules the
/// one with the latest start date wins (a rate change announced late
/// supersedes the schedule it overlaps). On an exact start-date tie the
/// schedule appearing later in `schedules` wins.
pub fn resolve_rate(schedules: &[PaymentSchedule], date: NaiveDate) -> Option<&PaymentSchedule> {
    schedules
        .iter()
        .enumerate()
        .filter(|(_, s)| s.covers(date))
        .max_by_key(|(idx, s)| (s.start, *idx))
        .map(|(_, s)| s)
}

/// Schedules that have not started yet as of `date`, soonest first.
pub fn future_schedules(schedules: &[PaymentSchedule], date: NaiveDate) -> Vec<&PaymentSchedule> {
    let mut future: Vec<&PaymentSchedule> =
        schedules.iter().filter(|s| s.start > date).collect();
    future.sort_by_key(|s| s.start);
    future
}
