use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::models::alert::InvestmentAlert;
use crate::models::asset::AssetId;
use crate::models::holding::Holding;
use crate::models::portfolio::{Portfolio, PortfolioId};
use crate::models::transaction::Transaction;
use crate::models::user::UserId;
use crate::models::wallet::Wallet;

/// New state for one (portfolio, asset) position.
#[derive(Debug, Clone, PartialEq)]
pub enum HoldingChange {
    Upsert(Holding),
    Remove { portfolio: PortfolioId, asset: AssetId },
}

impl HoldingChange {
    /// Portfolio the change applies to.
    pub fn portfolio(&self) -> PortfolioId {
        match self {
            HoldingChange::Upsert(holding) => holding.portfolio,
            HoldingChange::Remove { portfolio, .. } => *portfolio,
        }
    }
}

/// Everything one trade or wallet movement writes, committed as a unit.
///
/// The executor stages mutations on local copies and hands them over here;
/// nothing reaches the store until `LedgerStore::commit` accepts the whole set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub wallet: Option<Wallet>,
    pub holding: Option<HoldingChange>,
    pub transaction: Option<Transaction>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet(mut self, wallet: Wallet) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_holding(mut self, change: HoldingChange) -> Self {
        self.holding = Some(change);
        self
    }

    pub fn with_transaction(mut self, transaction: Transaction) -> Self {
        self.transaction = Some(transaction);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.wallet.is_none() && self.holding.is_none() && self.transaction.is_none()
    }
}

/// Consistent read of everything valuation and alerting need for one user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserSnapshot {
    /// All portfolios, active or not
    pub portfolios: Vec<Portfolio>,
    /// Holdings of those portfolios
    pub holdings: Vec<Holding>,
    pub alerts: Vec<InvestmentAlert>,
}

/// The persistence boundary.
///
/// Implementations must apply a `ChangeSet` atomically: either every record
/// in it becomes visible or none does, and readers never observe a
/// partially-applied set.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // ── Wallets ─────────────────────────────────────────────────────
    async fn get_wallet(&self, user: &UserId) -> Result<Option<Wallet>, LedgerError>;

    /// Return the user's wallet, creating an empty one in `currency` if absent.
    async fn get_or_create_wallet(&self, user: &UserId, currency: &str) -> Result<Wallet, LedgerError>;

    // ── Portfolios ──────────────────────────────────────────────────
    async fn get_portfolio(&self, id: PortfolioId) -> Result<Option<Portfolio>, LedgerError>;

    async fn list_portfolios(&self, user: &UserId) -> Result<Vec<Portfolio>, LedgerError>;

    /// Insert or replace a portfolio record.
    async fn save_portfolio(&self, portfolio: Portfolio) -> Result<(), LedgerError>;

    // ── Holdings ────────────────────────────────────────────────────
    async fn get_holding(
        &self,
        portfolio: PortfolioId,
        asset: &AssetId,
    ) -> Result<Option<Holding>, LedgerError>;

    async fn list_holdings(&self, portfolio: PortfolioId) -> Result<Vec<Holding>, LedgerError>;

    // ── Transactions ────────────────────────────────────────────────
    /// The user's transactions in the order they were committed.
    async fn list_transactions(&self, user: &UserId) -> Result<Vec<Transaction>, LedgerError>;

    // ── Alerts ──────────────────────────────────────────────────────
    async fn get_alert(&self, id: Uuid) -> Result<Option<InvestmentAlert>, LedgerError>;

    async fn list_alerts(&self, user: &UserId) -> Result<Vec<InvestmentAlert>, LedgerError>;

    /// Insert or replace an alert record.
    async fn save_alert(&self, alert: InvestmentAlert) -> Result<(), LedgerError>;

    /// Record a trigger at `at` if the alert exists and is still active,
    /// switching it off when `deactivate` is set. Check and write happen as
    /// one step. Returns the updated alert, or `None` when nothing fired.
    async fn mark_alert_triggered(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        deactivate: bool,
    ) -> Result<Option<InvestmentAlert>, LedgerError>;

    /// Set only the active flag, leaving trigger history as stored.
    /// `None` if the alert does not exist.
    async fn update_alert_active(&self, id: Uuid, active: bool) -> Result<Option<InvestmentAlert>, LedgerError>;

    /// Returns `true` if an alert was removed.
    async fn delete_alert(&self, id: Uuid) -> Result<bool, LedgerError>;

    // ── Snapshot / Commit ───────────────────────────────────────────
    async fn user_snapshot(&self, user: &UserId) -> Result<UserSnapshot, LedgerError>;

    /// Apply a change set atomically.
    async fn commit(&self, changes: ChangeSet) -> Result<(), LedgerError>;
}
