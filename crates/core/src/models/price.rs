use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::Money;

/// Market state of one asset as reported by the price catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Current price
    pub price: Money,

    /// Previously recorded price; the reference point for percentage-change alerts
    #[serde(default)]
    pub reference_price: Option<Money>,

    /// Most recent traded volume, if the catalog tracks it
    #[serde(default)]
    pub volume: Option<Decimal>,

    pub as_of: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn new(price: Money) -> Self {
        Self {
            price,
            reference_price: None,
            volume: None,
            as_of: Utc::now(),
        }
    }

    pub fn with_reference(mut self, reference_price: Money) -> Self {
        self.reference_price = Some(reference_price);
        self
    }

    pub fn with_volume(mut self, volume: Decimal) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Absolute percentage move from the reference price, rounded for display.
    /// `None` without a usable (positive) reference.
    pub fn percentage_change(&self) -> Option<Decimal> {
        let reference = self.reference_price.filter(|r| r.is_positive())?;
        Some((self.price - reference).abs().percent_of(reference))
    }

    /// Whether the price moved at least `threshold_percent` from the reference.
    ///
    /// Exact: compares `|price - ref| * 100` with `threshold * ref` so no
    /// rounded percentage decides a boundary case.
    pub fn moved_at_least(&self, threshold_percent: Decimal) -> bool {
        let Some(reference) = self.reference_price.filter(|r| r.is_positive()) else {
            return false;
        };
        let moved = (self.price - reference).abs().amount().checked_mul(Decimal::ONE_HUNDRED);
        let bar = threshold_percent.checked_mul(reference.amount());
        match (moved, bar) {
            (Some(moved), Some(bar)) => moved >= bar,
            // threshold × reference overflowed: no real move reaches it
            (Some(_), None) => false,
            // the move itself overflowed: it exceeds any representable bar
            (None, _) => true,
        }
    }
}
