use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::holding::Holding;
use super::money::Money;
use super::portfolio::PortfolioId;

/// Aggregate view over all of a user's active portfolios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Number of active portfolios
    pub total_portfolios: usize,

    /// Σ quantity × current price over every holding
    pub total_value: Money,

    /// Σ quantity × average cost over every holding
    pub total_cost: Money,

    /// total_value - total_cost
    pub total_profit_loss: Money,

    /// total_profit_loss / total_cost × 100, or 0 when nothing is invested
    pub total_profit_loss_percentage: Decimal,

    pub active_alerts: usize,

    /// Per-portfolio breakdown
    pub portfolios: Vec<PortfolioValuation>,
}

/// Valuation of a single portfolio at current prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    pub portfolio: PortfolioId,

    pub name: String,

    pub total_value: Money,

    pub total_cost: Money,

    pub profit_loss: Money,

    pub holdings: Vec<HoldingDetail>,
}

/// A holding together with its derived valuation at the current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingDetail {
    pub holding: Holding,

    pub current_price: Money,

    pub total_value: Money,

    pub total_cost: Money,

    pub profit_loss: Money,

    pub profit_loss_percentage: Decimal,
}

impl HoldingDetail {
    pub fn from_holding(holding: Holding, current_price: Money) -> Result<Self, crate::errors::LedgerError> {
        Ok(Self {
            total_value: holding.total_value(current_price)?,
            total_cost: holding.total_cost()?,
            profit_loss: holding.profit_loss(current_price)?,
            profit_loss_percentage: holding.profit_loss_percent(current_price)?,
            current_price,
            holding,
        })
    }
}
