use chrono::NaiveDate;
use flatledger_core::{FlatmateId, MatchKind, Money, PaymentSchedule};
use rust_decimal::Decimal;

/// Inclusive ±20% band around each expected multiple of the weekly rate.
const TOLERANCE_LO: Decimal = Decimal::from_parts(8, 0, 0, false, 1); // 0.8
const TOLERANCE_HI: Decimal = Decimal::from_parts(12, 0, 0, false, 1); // 1.2

/// Classify an incoming payment from a flatmate against their schedule
/// history as of the payment date.
///
/// Payments near 1x, 2x or 3x the weekly rate are rent (people pay weekly,
/// fortnightly, or catch up three weeks at once); small amounts look like
/// grocery reimbursements; anything else is unclassified money movement.
pub fn classify_incoming(
    flatmate: FlatmateId,
    amount: Money,
    on: NaiveDate,
    schedules: &[PaymentSchedule],
) -> (MatchKind, f32) {
    let active = schedules
        .iter()
        .enumerate()
        .filter(|(_, s)| s.flatmate_id == flatmate && s.covers(on))
        // Latest start wins on overlap; input order breaks exact ties.
        .max_by_key(|(idx, s)| (s.start, *idx))
        .map(|(_, s)| s);

    let Some(schedule) = active else {
        return (MatchKind::Other, 0.7);
    };

    let rate = schedule.weekly_rate;
    for (multiple, confidence) in [(1, 0.95), (2, 0.9), (3, 0.85)] {
        let expected = rate * Decimal::from(multiple);
        let lo = expected * TOLERANCE_LO;
        let hi = expected * TOLERANCE_HI;
        if amount >= lo && amount <= hi {
            return (MatchKind::RentPayment, confidence);
        }
    }

    if amount < rate.half() {
        (MatchKind::GroceryReimbursement, 0.7)
    } else {
        (MatchKind::Other, 0.6)
    }
}
