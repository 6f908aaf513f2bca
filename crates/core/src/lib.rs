pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use errors::LedgerError;
use models::{
    alert::{AlertType, InvestmentAlert},
    analytics::{HoldingDetail, PortfolioSummary, PortfolioValuation},
    asset::AssetId,
    holding::Holding,
    money::Money,
    portfolio::{Portfolio, PortfolioId},
    settings::LedgerSettings,
    transaction::Transaction,
    user::UserId,
    wallet::Wallet,
};
use providers::traits::PriceSource;
use services::{
    alert_service::AlertService,
    portfolio_service::PortfolioService,
    trade_executor::{TradeExecutor, TradeRequest},
    transaction_log::{TransactionFilter, TransactionLog},
    valuation_service::ValuationService,
};
use storage::memory::InMemoryStore;
use storage::traits::LedgerStore;

/// Main entry point for the portfolio ledger core.
///
/// Wires the services over one persistence boundary and one price source.
/// Every method takes `&self`; share it behind an `Arc` to serve concurrent
/// requests. Callers pass the authenticated `UserId`; ownership of
/// portfolios, holdings and alerts is always checked against it.
#[must_use]
pub struct PortfolioLedger {
    store: Arc<dyn LedgerStore>,
    settings: LedgerSettings,
    portfolio_service: PortfolioService,
    trade_executor: TradeExecutor,
    valuation_service: ValuationService,
    alert_service: AlertService,
    transaction_log: TransactionLog,
}

impl std::fmt::Debug for PortfolioLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioLedger")
            .field("settings", &self.settings)
            .finish()
    }
}

impl PortfolioLedger {
    /// Build a ledger over the given store and price source.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        prices: Arc<dyn PriceSource>,
        settings: LedgerSettings,
    ) -> Result<Self, LedgerError> {
        Ok(Self::build(store, prices, settings.validated()?))
    }

    /// A ledger backed by a fresh `InMemoryStore` with default settings.
    pub fn in_memory(prices: Arc<dyn PriceSource>) -> Self {
        Self::build(Arc::new(InMemoryStore::new()), prices, LedgerSettings::default())
    }

    fn build(store: Arc<dyn LedgerStore>, prices: Arc<dyn PriceSource>, settings: LedgerSettings) -> Self {
        Self {
            portfolio_service: PortfolioService::new(store.clone()),
            trade_executor: TradeExecutor::new(store.clone(), prices.clone(), settings.clone()),
            valuation_service: ValuationService::new(store.clone(), prices.clone()),
            alert_service: AlertService::new(store.clone(), prices, settings.alert_policy),
            transaction_log: TransactionLog::new(),
            store,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    // ── Trades ──────────────────────────────────────────────────────

    /// Buy an asset into one of the user's active portfolios.
    pub async fn execute_buy(&self, user: &UserId, request: &TradeRequest) -> Result<Transaction, LedgerError> {
        self.trade_executor.execute_buy(user, request).await
    }

    /// Sell an asset out of one of the user's active portfolios.
    pub async fn execute_sell(&self, user: &UserId, request: &TradeRequest) -> Result<Transaction, LedgerError> {
        self.trade_executor.execute_sell(user, request).await
    }

    // ── Wallet ──────────────────────────────────────────────────────

    /// Add cash to the user's wallet.
    pub async fn deposit(&self, user: &UserId, amount: Money, notes: Option<String>) -> Result<Transaction, LedgerError> {
        self.trade_executor.deposit(user, amount, notes).await
    }

    /// Take cash out of the user's wallet.
    pub async fn withdraw(&self, user: &UserId, amount: Money, notes: Option<String>) -> Result<Transaction, LedgerError> {
        self.trade_executor.withdraw(user, amount, notes).await
    }

    /// The user's wallet, created empty on first access.
    pub async fn wallet(&self, user: &UserId) -> Result<Wallet, LedgerError> {
        self.store
            .get_or_create_wallet(user, &self.settings.default_currency)
            .await
    }

    /// Current cash balance.
    pub async fn wallet_balance(&self, user: &UserId) -> Result<Money, LedgerError> {
        Ok(self.wallet(user).await?.balance())
    }

    // ── Portfolios ──────────────────────────────────────────────────

    pub async fn create_portfolio(
        &self,
        user: &UserId,
        name: &str,
        description: Option<String>,
    ) -> Result<Portfolio, LedgerError> {
        self.portfolio_service.create_portfolio(user, name, description).await
    }

    /// Soft-delete a portfolio; its history is kept.
    pub async fn deactivate_portfolio(&self, user: &UserId, id: PortfolioId) -> Result<Portfolio, LedgerError> {
        self.portfolio_service.deactivate_portfolio(user, id).await
    }

    /// Active portfolios of the user.
    pub async fn list_portfolios(&self, user: &UserId) -> Result<Vec<Portfolio>, LedgerError> {
        self.portfolio_service.list_portfolios(user).await
    }

    pub async fn get_portfolio(&self, user: &UserId, id: PortfolioId) -> Result<Portfolio, LedgerError> {
        self.portfolio_service.get_portfolio(user, id).await
    }

    pub async fn list_holdings(&self, user: &UserId, portfolio: PortfolioId) -> Result<Vec<Holding>, LedgerError> {
        self.portfolio_service.list_holdings(user, portfolio).await
    }

    // ── Valuation ───────────────────────────────────────────────────

    pub async fn holding_detail(
        &self,
        user: &UserId,
        portfolio: PortfolioId,
        asset: &AssetId,
    ) -> Result<HoldingDetail, LedgerError> {
        self.valuation_service.holding_detail(user, portfolio, asset).await
    }

    pub async fn portfolio_total_value(&self, user: &UserId, portfolio: PortfolioId) -> Result<Money, LedgerError> {
        self.valuation_service.portfolio_total_value(user, portfolio).await
    }

    pub async fn portfolio_valuation(
        &self,
        user: &UserId,
        portfolio: PortfolioId,
    ) -> Result<PortfolioValuation, LedgerError> {
        self.valuation_service.portfolio_valuation(user, portfolio).await
    }

    /// Totals across all active portfolios of the user.
    pub async fn portfolio_summary(&self, user: &UserId) -> Result<PortfolioSummary, LedgerError> {
        self.valuation_service.portfolio_summary(user).await
    }

    // ── Alerts ──────────────────────────────────────────────────────

    pub async fn create_alert(
        &self,
        user: &UserId,
        asset: &AssetId,
        alert_type: AlertType,
        threshold_value: Decimal,
    ) -> Result<InvestmentAlert, LedgerError> {
        self.alert_service
            .create_alert(user, asset, alert_type, threshold_value)
            .await
    }

    pub async fn remove_alert(&self, user: &UserId, id: Uuid) -> Result<(), LedgerError> {
        self.alert_service.remove_alert(user, id).await
    }

    pub async fn set_alert_active(&self, user: &UserId, id: Uuid, active: bool) -> Result<InvestmentAlert, LedgerError> {
        self.alert_service.set_alert_active(user, id, active).await
    }

    pub async fn list_alerts(&self, user: &UserId) -> Result<Vec<InvestmentAlert>, LedgerError> {
        self.alert_service.list_alerts(user).await
    }

    /// Run the alert pass for the user; returns the alerts that fired.
    pub async fn evaluate_alerts(&self, user: &UserId) -> Result<Vec<InvestmentAlert>, LedgerError> {
        self.alert_service.evaluate_alerts(user).await
    }

    // ── Transaction Log ─────────────────────────────────────────────

    /// All of the user's transactions, newest first.
    pub async fn transactions(&self, user: &UserId) -> Result<Vec<Transaction>, LedgerError> {
        self.transactions_matching(user, &TransactionFilter::default()).await
    }

    /// The user's transactions matching `filter`, newest first.
    pub async fn transactions_matching(
        &self,
        user: &UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let all = self.store.list_transactions(user).await?;
        Ok(self.transaction_log.query(all, filter))
    }

    /// Rebuild the user's positions from the log alone.
    pub async fn replay_holdings(
        &self,
        user: &UserId,
    ) -> Result<BTreeMap<(PortfolioId, AssetId), Holding>, LedgerError> {
        let all = self.store.list_transactions(user).await?;
        self.transaction_log.replay_holdings(&all)
    }

    /// Profit/loss booked by the user's sells.
    pub async fn realized_profit_loss(&self, user: &UserId) -> Result<Money, LedgerError> {
        let all = self.store.list_transactions(user).await?;
        self.transaction_log.realized_profit_loss(&all)
    }

    /// Export the user's transactions (commit order) as JSON.
    pub async fn export_transactions_to_json(&self, user: &UserId) -> Result<String, LedgerError> {
        let all = self.store.list_transactions(user).await?;
        self.transaction_log.export_json(&all)
    }

    /// Export the user's transactions (commit order) as CSV.
    pub async fn export_transactions_to_csv(&self, user: &UserId) -> Result<String, LedgerError> {
        let all = self.store.list_transactions(user).await?;
        Ok(self.transaction_log.export_csv(&all))
    }
}
