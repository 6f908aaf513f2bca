use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset::AssetId;
use super::money::{Money, Quantity};
use super::portfolio::PortfolioId;
use crate::errors::LedgerError;

/// A position of one asset within one portfolio, carried as a single
/// weighted-average lot.
///
/// A holding with zero quantity is logically absent: the ledger removes it
/// instead of storing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub portfolio: PortfolioId,

    pub asset: AssetId,

    pub quantity: Quantity,

    /// Blended purchase price per unit; meaningful only while quantity > 0
    pub average_cost: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    pub fn new(portfolio: PortfolioId, asset: AssetId, quantity: Quantity, average_cost: Money) -> Self {
        let now = Utc::now();
        Self {
            portfolio,
            asset,
            quantity,
            average_cost,
            created_at: now,
            updated_at: now,
        }
    }

    /// `quantity * current_price`
    pub fn total_value(&self, current_price: Money) -> Result<Money, LedgerError> {
        self.quantity.value_at(current_price)
    }

    /// `quantity * average_cost`
    pub fn total_cost(&self) -> Result<Money, LedgerError> {
        self.quantity.value_at(self.average_cost)
    }

    /// Unrealized profit/loss at `current_price`.
    pub fn profit_loss(&self, current_price: Money) -> Result<Money, LedgerError> {
        Ok(self.total_value(current_price)? - self.total_cost()?)
    }

    /// Unrealized profit/loss as a percentage of cost; 0 when cost is 0.
    pub fn profit_loss_percent(&self, current_price: Money) -> Result<Decimal, LedgerError> {
        let total_cost = self.total_cost()?;
        Ok(self.profit_loss(current_price)?.percent_of(total_cost))
    }
}
