use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};

/// Signed amount in the household's currency. Positive = inflow,
/// negative = outflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100)).to_i64().unwrap_or(0)
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn to_decimal(self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_inflow(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_outflow(self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn half(self) -> Self {
        Money(self.0 / Decimal::from(2))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;
    fn mul(self, rhs: Decimal) -> Self {
        Money(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_round_trip() {
        assert_eq!(Money::from_cents(25000).to_cents(), 25000);
        assert_eq!(Money::from_cents(-4250).to_cents(), -4250);
    }

    #[test]
    fn sign_predicates() {
        assert!(Money::from_cents(100).is_inflow());
        assert!(Money::from_cents(-100).is_outflow());
        assert!(!Money::zero().is_inflow());
        assert!(!Money::zero().is_outflow());
    }

    #[test]
    fn half_is_exact() {
        assert_eq!(Money::from_cents(25000).half(), Money::from_cents(12500));
    }

    #[test]
    fn sum_of_amounts() {
        let total: Money = [Money::from_cents(100), Money::from_cents(-40)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(60));
    }

    #[test]
    fn display_format() {
        assert_eq!(Money::from_cents(25000).to_string(), "$250.00");
    }
}
