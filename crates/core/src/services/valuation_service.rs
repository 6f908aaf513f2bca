use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::errors::LedgerError;
use crate::models::analytics::{HoldingDetail, PortfolioSummary, PortfolioValuation};
use crate::models::asset::AssetId;
use crate::models::holding::Holding;
use crate::models::money::Money;
use crate::models::portfolio::{Portfolio, PortfolioId};
use crate::models::user::UserId;
use crate::providers::traits::PriceSource;
use crate::services::portfolio_service::PortfolioService;
use crate::storage::traits::LedgerStore;

/// Values holdings at current catalog prices.
///
/// Read-only: every figure is derived from committed holdings (one
/// consistent snapshot per call) plus prices from the `PriceSource`.
pub struct ValuationService {
    store: Arc<dyn LedgerStore>,
    prices: Arc<dyn PriceSource>,
    portfolios: PortfolioService,
}

impl ValuationService {
    pub fn new(store: Arc<dyn LedgerStore>, prices: Arc<dyn PriceSource>) -> Self {
        Self {
            portfolios: PortfolioService::new(store.clone()),
            store,
            prices,
        }
    }

    /// One holding with its valuation at the current price.
    pub async fn holding_detail(
        &self,
        user: &UserId,
        portfolio: PortfolioId,
        asset: &AssetId,
    ) -> Result<HoldingDetail, LedgerError> {
        let portfolio = self.portfolios.get_portfolio(user, portfolio).await?;
        let holding = self
            .store
            .get_holding(portfolio.id, asset)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("holding {asset} in portfolio {}", portfolio.id)))?;
        let price = self.prices.get_current_price(asset).await?;
        HoldingDetail::from_holding(holding, price)
    }

    /// Σ quantity × current price over the portfolio's holdings.
    pub async fn portfolio_total_value(
        &self,
        user: &UserId,
        portfolio: PortfolioId,
    ) -> Result<Money, LedgerError> {
        Ok(self.portfolio_valuation(user, portfolio).await?.total_value)
    }

    /// Full valuation of one portfolio.
    pub async fn portfolio_valuation(
        &self,
        user: &UserId,
        portfolio: PortfolioId,
    ) -> Result<PortfolioValuation, LedgerError> {
        let portfolio = self.portfolios.get_portfolio(user, portfolio).await?;
        let holdings = self.store.list_holdings(portfolio.id).await?;
        let mut prices = HashMap::new();
        self.value_portfolio(&portfolio, holdings, &mut prices).await
    }

    /// Aggregate over every active portfolio of the user.
    ///
    /// The weighted percentage is `total_profit_loss / total_cost × 100`
    /// (0 when nothing is invested), not an average of per-holding percentages.
    pub async fn portfolio_summary(&self, user: &UserId) -> Result<PortfolioSummary, LedgerError> {
        let snapshot = self.store.user_snapshot(user).await?;

        let mut by_portfolio: HashMap<PortfolioId, Vec<Holding>> = HashMap::new();
        for holding in snapshot.holdings {
            by_portfolio.entry(holding.portfolio).or_default().push(holding);
        }

        let mut prices = HashMap::new();
        let mut valuations = Vec::new();
        for portfolio in snapshot.portfolios.iter().filter(|p| p.is_active) {
            let holdings = by_portfolio.remove(&portfolio.id).unwrap_or_default();
            valuations.push(self.value_portfolio(portfolio, holdings, &mut prices).await?);
        }

        let total_value = Money::try_sum(valuations.iter().map(|v| v.total_value))?;
        let total_cost = Money::try_sum(valuations.iter().map(|v| v.total_cost))?;
        let total_profit_loss = total_value - total_cost;
        let active_alerts = snapshot.alerts.iter().filter(|a| a.is_active).count();

        debug!(user = %user, portfolios = valuations.len(), total_value = %total_value, "portfolio summary computed");

        Ok(PortfolioSummary {
            total_portfolios: valuations.len(),
            total_value,
            total_cost,
            total_profit_loss,
            total_profit_loss_percentage: total_profit_loss.percent_of(total_cost),
            active_alerts,
            portfolios: valuations,
        })
    }

    async fn value_portfolio(
        &self,
        portfolio: &Portfolio,
        holdings: Vec<Holding>,
        prices: &mut HashMap<AssetId, Money>,
    ) -> Result<PortfolioValuation, LedgerError> {
        let mut details = Vec::with_capacity(holdings.len());
        for holding in holdings {
            let price = match prices.get(&holding.asset) {
                Some(price) => *price,
                None => {
                    let price = self.prices.get_current_price(&holding.asset).await?;
                    prices.insert(holding.asset.clone(), price);
                    price
                }
            };
            details.push(HoldingDetail::from_holding(holding, price)?);
        }

        // Largest position first
        details.sort_by(|a, b| b.total_value.cmp(&a.total_value));

        let total_value = Money::try_sum(details.iter().map(|d| d.total_value))?;
        let total_cost = Money::try_sum(details.iter().map(|d| d.total_cost))?;

        Ok(PortfolioValuation {
            portfolio: portfolio.id,
            name: portfolio.name.clone(),
            total_value,
            total_cost,
            profit_loss: total_value - total_cost,
            holdings: details,
        })
    }
}
