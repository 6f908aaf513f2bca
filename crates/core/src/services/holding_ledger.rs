use chrono::Utc;

use crate::errors::LedgerError;
use crate::models::asset::AssetId;
use crate::models::holding::Holding;
use crate::models::money::{weighted_average_cost, Money, Quantity};
use crate::models::portfolio::PortfolioId;
use crate::storage::traits::HoldingChange;

/// Result of taking shares out of a position.
#[derive(Debug, Clone, PartialEq)]
pub enum ReduceOutcome {
    /// Shares remain; average cost is unchanged.
    Remaining(Holding),
    /// The position reached exactly zero and no longer exists.
    Removed {
        portfolio: PortfolioId,
        asset: AssetId,
    },
}

impl ReduceOutcome {
    pub fn into_change(self) -> HoldingChange {
        match self {
            ReduceOutcome::Remaining(holding) => HoldingChange::Upsert(holding),
            ReduceOutcome::Removed { portfolio, asset } => {
                HoldingChange::Remove { portfolio, asset }
            }
        }
    }
}

/// Weighted-average cost-basis accounting for a single position.
///
/// Pure business logic over `Option<Holding>`: the caller loads the current
/// position, applies the change here, and persists the result. One blended
/// lot per position, no FIFO/LIFO lot tracking.
pub struct HoldingLedger;

impl HoldingLedger {
    pub fn new() -> Self {
        Self
    }

    /// Add `quantity` bought at `unit_price`.
    ///
    /// A new position starts at `average_cost = unit_price`; an existing one
    /// is re-averaged as `(oldQ * oldAvg + q * p) / (oldQ + q)`.
    pub fn accumulate(
        &self,
        existing: Option<Holding>,
        portfolio: PortfolioId,
        asset: AssetId,
        quantity: Quantity,
        unit_price: Money,
    ) -> Result<Holding, LedgerError> {
        let quantity = quantity.ensure_positive("Quantity")?;
        let unit_price = unit_price.ensure_positive("Unit price")?;

        match existing {
            None => Ok(Holding::new(portfolio, asset, quantity, unit_price)),
            Some(mut holding) => {
                holding.average_cost = weighted_average_cost(
                    holding.quantity,
                    holding.average_cost,
                    quantity,
                    unit_price,
                )?;
                holding.quantity = holding.quantity.checked_add(quantity).ok_or_else(|| {
                    LedgerError::ValidationError(format!(
                        "Quantity overflow adding {quantity} to {}",
                        holding.quantity
                    ))
                })?;
                holding.updated_at = Utc::now();
                Ok(holding)
            }
        }
    }

    /// Take `quantity` out of the position.
    ///
    /// Fails with `InsufficientHolding` if there is no position or it is
    /// smaller than `quantity`.
    pub fn reduce(
        &self,
        existing: Option<Holding>,
        asset: &AssetId,
        quantity: Quantity,
    ) -> Result<ReduceOutcome, LedgerError> {
        let quantity = quantity.ensure_positive("Quantity")?;

        let Some(mut holding) = existing else {
            return Err(LedgerError::InsufficientHolding {
                asset: asset.to_string(),
                requested: quantity,
                available: Quantity::ZERO,
            });
        };

        let remaining = holding.quantity.checked_sub(quantity).ok_or_else(|| {
            LedgerError::InsufficientHolding {
                asset: asset.to_string(),
                requested: quantity,
                available: holding.quantity,
            }
        })?;

        if remaining.is_zero() {
            return Ok(ReduceOutcome::Removed {
                portfolio: holding.portfolio,
                asset: holding.asset,
            });
        }

        holding.quantity = remaining;
        holding.updated_at = Utc::now();
        Ok(ReduceOutcome::Remaining(holding))
    }
}

impl Default for HoldingLedger {
    fn default() -> Self {
        Self::new()
    }
}
