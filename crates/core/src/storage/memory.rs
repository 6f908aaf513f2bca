use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::traits::{ChangeSet, HoldingChange, LedgerStore, UserSnapshot};
use crate::errors::LedgerError;
use crate::models::alert::InvestmentAlert;
use crate::models::asset::AssetId;
use crate::models::holding::Holding;
use crate::models::portfolio::{Portfolio, PortfolioId};
use crate::models::transaction::Transaction;
use crate::models::user::UserId;
use crate::models::wallet::Wallet;

#[derive(Debug, Default)]
struct StoreState {
    wallets: HashMap<UserId, Wallet>,
    portfolios: HashMap<PortfolioId, Portfolio>,
    holdings: BTreeMap<(PortfolioId, AssetId), Holding>,
    /// Append-only, in commit order
    transactions: Vec<Transaction>,
    transaction_ids: HashSet<Uuid>,
    alerts: HashMap<Uuid, InvestmentAlert>,
}

/// Single-writer store kept in process memory.
///
/// All state sits behind one `RwLock`. A commit validates the whole change
/// set first and then applies it under a single write guard, so readers see
/// either the state before or after it.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, LedgerError> {
        self.state
            .read()
            .map_err(|_| LedgerError::PersistenceFailure("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, LedgerError> {
        self.state
            .write()
            .map_err(|_| LedgerError::PersistenceFailure("store lock poisoned".into()))
    }

    /// Number of holdings across all portfolios.
    pub fn holding_count(&self) -> Result<usize, LedgerError> {
        Ok(self.read()?.holdings.len())
    }

    /// Number of records in the transaction log.
    pub fn transaction_count(&self) -> Result<usize, LedgerError> {
        Ok(self.read()?.transactions.len())
    }

    /// A holding may only change inside a known, active portfolio owned by
    /// the user of the accompanying transaction. Runs under the commit's
    /// write guard, after any concurrent deactivation has landed.
    fn validate_target_portfolio(
        state: &StoreState,
        id: PortfolioId,
        tx: Option<&Transaction>,
    ) -> Result<(), LedgerError> {
        let Some(portfolio) = state.portfolios.get(&id) else {
            return Err(LedgerError::PersistenceFailure(format!(
                "holding references unknown portfolio {id}"
            )));
        };
        if !portfolio.is_active {
            return Err(LedgerError::ValidationError(format!(
                "Portfolio {id} is inactive"
            )));
        }
        if let Some(tx) = tx {
            if tx.user != portfolio.user {
                return Err(LedgerError::ValidationError(format!(
                    "Portfolio {id} does not belong to {}",
                    tx.user
                )));
            }
        }
        Ok(())
    }

    fn validate(state: &StoreState, changes: &ChangeSet) -> Result<(), LedgerError> {
        if let Some(wallet) = &changes.wallet {
            if wallet.balance().is_negative() {
                return Err(LedgerError::PersistenceFailure(format!(
                    "refusing negative balance for wallet {}",
                    wallet.user
                )));
            }
        }
        if let Some(HoldingChange::Upsert(holding)) = &changes.holding {
            if !holding.quantity.is_positive() {
                return Err(LedgerError::PersistenceFailure(format!(
                    "refusing zero-quantity holding {} in portfolio {}",
                    holding.asset, holding.portfolio
                )));
            }
        }
        if let Some(change) = &changes.holding {
            Self::validate_target_portfolio(state, change.portfolio(), changes.transaction.as_ref())?;
        }
        if let Some(tx) = &changes.transaction {
            if state.transaction_ids.contains(&tx.id) {
                return Err(LedgerError::PersistenceFailure(format!(
                    "transaction {} already logged",
                    tx.id
                )));
            }
            if !tx.total_amount.is_positive() {
                return Err(LedgerError::PersistenceFailure(format!(
                    "transaction {} has non-positive total",
                    tx.id
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn get_wallet(&self, user: &UserId) -> Result<Option<Wallet>, LedgerError> {
        Ok(self.read()?.wallets.get(user).cloned())
    }

    async fn get_or_create_wallet(&self, user: &UserId, currency: &str) -> Result<Wallet, LedgerError> {
        let mut state = self.write()?;
        let wallet = state
            .wallets
            .entry(user.clone())
            .or_insert_with(|| Wallet::new(user.clone(), currency));
        Ok(wallet.clone())
    }

    async fn get_portfolio(&self, id: PortfolioId) -> Result<Option<Portfolio>, LedgerError> {
        Ok(self.read()?.portfolios.get(&id).cloned())
    }

    async fn list_portfolios(&self, user: &UserId) -> Result<Vec<Portfolio>, LedgerError> {
        let state = self.read()?;
        let mut portfolios: Vec<Portfolio> = state
            .portfolios
            .values()
            .filter(|p| &p.user == user)
            .cloned()
            .collect();
        portfolios.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(portfolios)
    }

    async fn save_portfolio(&self, portfolio: Portfolio) -> Result<(), LedgerError> {
        self.write()?.portfolios.insert(portfolio.id, portfolio);
        Ok(())
    }

    async fn get_holding(
        &self,
        portfolio: PortfolioId,
        asset: &AssetId,
    ) -> Result<Option<Holding>, LedgerError> {
        Ok(self
            .read()?
            .holdings
            .get(&(portfolio, asset.clone()))
            .cloned())
    }

    async fn list_holdings(&self, portfolio: PortfolioId) -> Result<Vec<Holding>, LedgerError> {
        let state = self.read()?;
        Ok(state
            .holdings
            .values()
            .filter(|h| h.portfolio == portfolio)
            .cloned()
            .collect())
    }

    async fn list_transactions(&self, user: &UserId) -> Result<Vec<Transaction>, LedgerError> {
        let state = self.read()?;
        Ok(state
            .transactions
            .iter()
            .filter(|t| &t.user == user)
            .cloned()
            .collect())
    }

    async fn get_alert(&self, id: Uuid) -> Result<Option<InvestmentAlert>, LedgerError> {
        Ok(self.read()?.alerts.get(&id).cloned())
    }

    async fn list_alerts(&self, user: &UserId) -> Result<Vec<InvestmentAlert>, LedgerError> {
        let state = self.read()?;
        let mut alerts: Vec<InvestmentAlert> = state
            .alerts
            .values()
            .filter(|a| &a.user == user)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(alerts)
    }

    async fn save_alert(&self, alert: InvestmentAlert) -> Result<(), LedgerError> {
        self.write()?.alerts.insert(alert.id, alert);
        Ok(())
    }

    async fn mark_alert_triggered(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        deactivate: bool,
    ) -> Result<Option<InvestmentAlert>, LedgerError> {
        let mut state = self.write()?;
        let Some(alert) = state.alerts.get_mut(&id).filter(|a| a.is_active) else {
            return Ok(None);
        };
        alert.triggered_at = Some(at);
        if deactivate {
            alert.is_active = false;
        }
        Ok(Some(alert.clone()))
    }

    async fn update_alert_active(&self, id: Uuid, active: bool) -> Result<Option<InvestmentAlert>, LedgerError> {
        let mut state = self.write()?;
        Ok(state.alerts.get_mut(&id).map(|alert| {
            alert.is_active = active;
            alert.clone()
        }))
    }

    async fn delete_alert(&self, id: Uuid) -> Result<bool, LedgerError> {
        Ok(self.write()?.alerts.remove(&id).is_some())
    }

    async fn user_snapshot(&self, user: &UserId) -> Result<UserSnapshot, LedgerError> {
        let state = self.read()?;
        let portfolios: Vec<Portfolio> = state
            .portfolios
            .values()
            .filter(|p| &p.user == user)
            .cloned()
            .collect();
        let owned: HashSet<PortfolioId> = portfolios.iter().map(|p| p.id).collect();
        let holdings = state
            .holdings
            .values()
            .filter(|h| owned.contains(&h.portfolio))
            .cloned()
            .collect();
        let alerts = state
            .alerts
            .values()
            .filter(|a| &a.user == user)
            .cloned()
            .collect();
        Ok(UserSnapshot {
            portfolios,
            holdings,
            alerts,
        })
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), LedgerError> {
        let mut state = self.write()?;
        Self::validate(&state, &changes)?;

        if let Some(wallet) = changes.wallet {
            state.wallets.insert(wallet.user.clone(), wallet);
        }
        match changes.holding {
            Some(HoldingChange::Upsert(holding)) => {
                state
                    .holdings
                    .insert((holding.portfolio, holding.asset.clone()), holding);
            }
            Some(HoldingChange::Remove { portfolio, asset }) => {
                state.holdings.remove(&(portfolio, asset));
            }
            None => {}
        }
        if let Some(tx) = changes.transaction {
            state.transaction_ids.insert(tx.id);
            state.transactions.push(tx);
        }
        Ok(())
    }
}
