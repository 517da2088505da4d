use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::people::FlatmateId;
use super::schedule::{future_schedules, resolve_rate, PaymentSchedule};
use super::transaction::{MatchKind, Transaction};
use super::week::{local_date, weeks_in, DateRange, Week};

/// One Saturday-to-Friday bucket of one flatmate's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyObligation {
    pub week: Week,
    pub due_date: NaiveDate,
    /// Weekly rate of the schedule covering the week's Saturday; zero when
    /// no schedule covers it.
    pub due: Money,
    /// Sum of rent payments landing in this bucket.
    pub paid: Money,
    /// `paid - due`.
    pub balance: Money,
    /// The due date has not passed yet; the bucket is shown but still
    /// accumulating payments.
    pub in_progress: bool,
    /// Rent payments in this bucket, for display.
    pub rent_payments: Vec<Transaction>,
    /// This flatmate's non-rent transactions in this bucket, for display
    /// only; they never contribute to `paid`.
    pub other_transactions: Vec<Transaction>,
}

/// Aggregate view across the analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObligationReport {
    pub weeks: Vec<WeeklyObligation>,
    pub total_due: Money,
    pub total_paid: Money,
    /// `total_paid - total_due`.
    pub balance: Money,
    /// Rate of the schedule covering "now", if any.
    pub current_weekly_rate: Option<Money>,
    /// End date of that schedule, if it has one.
    pub current_schedule_end: Option<NaiveDate>,
    /// Schedules starting after "now", soonest first.
    pub future_schedules: Vec<PaymentSchedule>,
}

/// Bucket a flatmate's schedule history and matched transactions into
/// weekly obligations over `window`.
///
/// Pure and idempotent: identical inputs produce identical reports. Weeks
/// that have not started yet (bucket Saturday after "now" on the household
/// clock) are omitted entirely.
pub fn compute_obligations(
    flatmate: FlatmateId,
    schedules: &[PaymentSchedule],
    transactions: &[Transaction],
    window: DateRange,
    now: DateTime<Utc>,
    tz: Tz,
) -> ObligationReport {
    let today = local_date(now, tz);

    let schedules: Vec<PaymentSchedule> = schedules
        .iter()
        .filter(|s| s.flatmate_id == flatmate)
        .cloned()
        .collect();

    let mine: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.match_state.flatmate() == Some(flatmate))
        .collect();

    let mut weeks = Vec::new();
    let mut total_due = Money::zero();
    let mut total_paid = Money::zero();

    for week in weeks_in(window) {
        if week.start() > today {
            break;
        }

        let due = resolve_rate(&schedules, week.start())
            .map(|s| s.weekly_rate)
            .unwrap_or_else(Money::zero);

        let mut paid = Money::zero();
        let mut rent_payments = Vec::new();
        let mut other_transactions = Vec::new();
        for tx in &mine {
            // The first and last buckets extend past an unaligned window;
            // only dates inside both the week and the window count.
            let on = tx.local_date(tz);
            if !week.contains(on) || !window.contains(on) {
                continue;
            }
            if tx.match_state.kind() == Some(MatchKind::RentPayment) {
                paid = paid + tx.amount;
                rent_payments.push((*tx).clone());
            } else {
                other_transactions.push((*tx).clone());
            }
        }

        total_due = total_due + due;
        total_paid = total_paid + paid;

        weeks.push(WeeklyObligation {
            week,
            due_date: week.due_date(),
            due,
            paid,
            balance: paid - due,
            in_progress: today <= week.due_date(),
            rent_payments,
            other_transactions,
        });
    }

    let current = resolve_rate(&schedules, today);

    ObligationReport {
        weeks,
        total_due,
        total_paid,
        balance: total_paid - total_due,
        current_weekly_rate: current.map(|s| s.weekly_rate),
        current_schedule_end: current.and_then(|s| s.end),
        future_schedules: future_schedules(&schedules, today)
            .into_iter()
            .cloned()
            .collect(),
    }
}
