use std::sync::Arc;
use tracing::info;

use crate::errors::LedgerError;
use crate::models::holding::Holding;
use crate::models::portfolio::{Portfolio, PortfolioId};
use crate::models::user::UserId;
use crate::storage::traits::LedgerStore;

/// Maximum length of a portfolio name.
const MAX_NAME_LEN: usize = 100;

/// Manages the portfolio lifecycle and resolves portfolio ownership.
///
/// Ownership is always derived from the authenticated user passed in,
/// never from the portfolio record a caller claims to own.
pub struct PortfolioService {
    store: Arc<dyn LedgerStore>,
}

impl PortfolioService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Create a new active portfolio.
    /// Names are trimmed, non-empty, and unique (case-insensitive) among the
    /// user's active portfolios.
    pub async fn create_portfolio(
        &self,
        user: &UserId,
        name: &str,
        description: Option<String>,
    ) -> Result<Portfolio, LedgerError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::ValidationError(
                "Portfolio name must not be empty".into(),
            ));
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(LedgerError::ValidationError(format!(
                "Portfolio name exceeds {MAX_NAME_LEN} characters"
            )));
        }

        let existing = self.store.list_portfolios(user).await?;
        if existing
            .iter()
            .any(|p| p.is_active && p.name.eq_ignore_ascii_case(trimmed))
        {
            return Err(LedgerError::ValidationError(format!(
                "Portfolio '{trimmed}' already exists"
            )));
        }

        let portfolio = Portfolio::new(user.clone(), trimmed, description);
        self.store.save_portfolio(portfolio.clone()).await?;
        info!(user = %user, portfolio = %portfolio.id, name = %portfolio.name, "portfolio created");
        Ok(portfolio)
    }

    /// Soft-delete a portfolio. Its holdings and transactions stay in place.
    pub async fn deactivate_portfolio(
        &self,
        user: &UserId,
        id: PortfolioId,
    ) -> Result<Portfolio, LedgerError> {
        let mut portfolio = self.get_portfolio(user, id).await?;
        if portfolio.is_active {
            portfolio.deactivate();
            self.store.save_portfolio(portfolio.clone()).await?;
            info!(user = %user, portfolio = %id, "portfolio deactivated");
        }
        Ok(portfolio)
    }

    /// The user's active portfolios, oldest first.
    pub async fn list_portfolios(&self, user: &UserId) -> Result<Vec<Portfolio>, LedgerError> {
        let mut portfolios = self.store.list_portfolios(user).await?;
        portfolios.retain(|p| p.is_active);
        Ok(portfolios)
    }

    /// Look up one of the user's portfolios (active or not).
    /// Another user's portfolio is reported as `NotFound`.
    pub async fn get_portfolio(&self, user: &UserId, id: PortfolioId) -> Result<Portfolio, LedgerError> {
        self.store
            .get_portfolio(id)
            .await?
            .filter(|p| p.is_owned_by(user))
            .ok_or_else(|| LedgerError::NotFound(format!("portfolio {id}")))
    }

    /// Holdings of one of the user's portfolios.
    pub async fn list_holdings(&self, user: &UserId, id: PortfolioId) -> Result<Vec<Holding>, LedgerError> {
        let portfolio = self.get_portfolio(user, id).await?;
        self.store.list_holdings(portfolio.id).await
    }

    /// Resolve a portfolio a trade may touch.
    ///
    /// - unknown id → `NotFound`
    /// - owned by someone else, or deactivated → `ValidationError`
    pub async fn tradable_portfolio(
        &self,
        user: &UserId,
        id: PortfolioId,
    ) -> Result<Portfolio, LedgerError> {
        let portfolio = self
            .store
            .get_portfolio(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("portfolio {id}")))?;

        if !portfolio.is_owned_by(user) {
            return Err(LedgerError::ValidationError(format!(
                "Portfolio {id} does not belong to user {user}"
            )));
        }
        if !portfolio.is_active {
            return Err(LedgerError::ValidationError(format!(
                "Portfolio {id} is inactive"
            )));
        }
        Ok(portfolio)
    }
}
