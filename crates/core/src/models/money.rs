use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::errors::LedgerError;

/// Fractional digits kept for currency amounts.
pub const MONEY_SCALE: u32 = 2;

/// Fractional digits kept for asset quantities.
pub const QUANTITY_SCALE: u32 = 6;

/// Every rounding in the ledger goes through here: banker's rounding
/// (round half to even) at the target scale.
fn round_to(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven)
}

// ═══════════════════════════════════════════════════════════════════
// Money
// ═══════════════════════════════════════════════════════════════════

/// A currency amount with two fractional digits.
///
/// Signed, because profit/loss can be negative. Balance-affecting
/// operations check positivity at the boundary (`ensure_positive`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(round_to(value, MONEY_SCALE))
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    /// The underlying decimal value.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Reject zero and negative amounts with a `ValidationError` naming `what`.
    pub fn ensure_positive(self, what: &str) -> Result<Self, LedgerError> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(LedgerError::ValidationError(format!(
                "{what} must be positive, got {self}"
            )))
        }
    }

    /// Add, or `None` if the sum leaves the representable range.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Sum `values`, failing with a `ValidationError` instead of overflowing.
    pub fn try_sum(values: impl IntoIterator<Item = Money>) -> Result<Money, LedgerError> {
        values.into_iter().try_fold(Money::ZERO, |acc, m| {
            acc.checked_add(m)
                .ok_or_else(|| LedgerError::ValidationError(format!("Amount overflow adding {m} to {acc}")))
        })
    }

    /// `self / base * 100`, rounded to two digits. Zero when `base` is not positive.
    pub fn percent_of(&self, base: Money) -> Decimal {
        if !base.is_positive() {
            return Decimal::ZERO;
        }
        self.0
            .checked_div(base.0)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|pct| round_to(pct, MONEY_SCALE))
            .unwrap_or(Decimal::ZERO)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Quantity
// ═══════════════════════════════════════════════════════════════════

/// An asset quantity with six fractional digits. Never negative at rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(round_to(value, QUANTITY_SCALE))
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn ensure_positive(self, what: &str) -> Result<Self, LedgerError> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(LedgerError::ValidationError(format!(
                "{what} must be positive, got {self}"
            )))
        }
    }

    /// Value of this quantity at `price`, rounded to money scale.
    pub fn value_at(&self, price: Money) -> Result<Money, LedgerError> {
        self.0
            .checked_mul(price.0)
            .map(Money::new)
            .ok_or_else(|| {
                LedgerError::ValidationError(format!(
                    "Amount overflow computing {self} × {price}"
                ))
            })
    }

    pub fn checked_add(&self, rhs: Quantity) -> Option<Quantity> {
        self.0.checked_add(rhs.0).map(Quantity)
    }

    /// Subtract, or `None` if the result would be negative.
    pub fn checked_sub(&self, rhs: Quantity) -> Option<Quantity> {
        let diff = self.0 - rhs.0;
        if diff < Decimal::ZERO {
            None
        } else {
            Some(Quantity(diff))
        }
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Quantity::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Quantity {
        iter.fold(Quantity::ZERO, |acc, q| acc + q)
    }
}

/// Weighted-average cost after adding `quantity` at `unit_price` to a position of
/// `old_quantity` at `old_average`:
/// `(oldQ * oldAvg + q * p) / (oldQ + q)`, computed exactly then rounded once.
pub fn weighted_average_cost(
    old_quantity: Quantity,
    old_average: Money,
    quantity: Quantity,
    unit_price: Money,
) -> Result<Money, LedgerError> {
    let overflow = || LedgerError::ValidationError("Cost basis overflow".into());

    let old_cost = old_quantity.0.checked_mul(old_average.0).ok_or_else(overflow)?;
    let new_cost = quantity.0.checked_mul(unit_price.0).ok_or_else(overflow)?;
    let total_cost = old_cost.checked_add(new_cost).ok_or_else(overflow)?;
    let total_quantity = old_quantity.0.checked_add(quantity.0).ok_or_else(overflow)?;

    if total_quantity.is_zero() {
        return Err(LedgerError::ValidationError(
            "Cannot average over a zero quantity".into(),
        ));
    }

    total_cost
        .checked_div(total_quantity)
        .map(Money::new)
        .ok_or_else(overflow)
}
