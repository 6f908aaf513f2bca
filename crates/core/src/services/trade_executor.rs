use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::errors::LedgerError;
use crate::models::asset::AssetId;
use crate::models::money::{Money, Quantity};
use crate::models::portfolio::PortfolioId;
use crate::models::settings::LedgerSettings;
use crate::models::transaction::{Transaction, TransactionType};
use crate::models::user::UserId;
use crate::providers::traits::PriceSource;
use crate::services::holding_ledger::HoldingLedger;
use crate::services::lock_table::{LockKey, LockTable};
use crate::services::portfolio_service::PortfolioService;
use crate::storage::traits::{ChangeSet, HoldingChange, LedgerStore};

/// Base pause between conflict retries; grows linearly with the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// A buy or sell as submitted by the request-handling layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub portfolio: PortfolioId,
    pub asset: AssetId,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl TradeRequest {
    pub fn new(portfolio: PortfolioId, asset: impl Into<AssetId>, quantity: Quantity, unit_price: Money) -> Self {
        Self {
            portfolio,
            asset: asset.into(),
            quantity,
            unit_price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    fn transaction_type(self) -> TransactionType {
        match self {
            TradeSide::Buy => TransactionType::Buy,
            TradeSide::Sell => TransactionType::Sell,
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// Progress of one trade. `Rejected` can follow any stage before `Logged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStage {
    /// Inputs, ownership and asset checked
    Validated,
    /// Wallet and holding locks held
    Reserved,
    /// Wallet and holding mutated on staged copies
    Applied,
    /// Change set committed, transaction in the log
    Logged,
    Rejected,
}

impl std::fmt::Display for TradeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeStage::Validated => write!(f, "validated"),
            TradeStage::Reserved => write!(f, "reserved"),
            TradeStage::Applied => write!(f, "applied"),
            TradeStage::Logged => write!(f, "logged"),
            TradeStage::Rejected => write!(f, "rejected"),
        }
    }
}

/// Executes trades and wallet movements as single atomic units.
///
/// Each operation:
/// 1. validates the request (no locks held),
/// 2. takes the wallet lock and, for trades, the holding lock,
/// 3. reads the current wallet/holding and applies the change to local copies,
/// 4. commits wallet, holding and transaction together in one `ChangeSet`.
///
/// A rejection or a failed commit therefore leaves the store exactly as it
/// was; there is never a debit to roll back. Lock timeouts are retried up to
/// `max_conflict_retries` times.
pub struct TradeExecutor {
    store: Arc<dyn LedgerStore>,
    prices: Arc<dyn PriceSource>,
    portfolios: PortfolioService,
    holding_ledger: HoldingLedger,
    locks: LockTable,
    settings: LedgerSettings,
}

impl TradeExecutor {
    pub fn new(store: Arc<dyn LedgerStore>, prices: Arc<dyn PriceSource>, settings: LedgerSettings) -> Self {
        Self {
            portfolios: PortfolioService::new(store.clone()),
            holding_ledger: HoldingLedger::new(),
            locks: LockTable::new(settings.lock_timeout()),
            store,
            prices,
            settings,
        }
    }

    /// Buy `request.quantity` units, paying `quantity × unit_price` from the wallet.
    pub async fn execute_buy(&self, user: &UserId, request: &TradeRequest) -> Result<Transaction, LedgerError> {
        self.execute(user, request, TradeSide::Buy).await
    }

    /// Sell `request.quantity` units, crediting `quantity × unit_price` to the wallet.
    pub async fn execute_sell(&self, user: &UserId, request: &TradeRequest) -> Result<Transaction, LedgerError> {
        self.execute(user, request, TradeSide::Sell).await
    }

    /// Add cash to the user's wallet.
    pub async fn deposit(
        &self,
        user: &UserId,
        amount: Money,
        notes: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        self.with_retry("deposit", || {
            self.try_cash_movement(user, TransactionType::Deposit, amount, notes.clone())
        })
        .await
    }

    /// Take cash out of the user's wallet. Fails with `InsufficientFunds`
    /// rather than overdrawing.
    pub async fn withdraw(
        &self,
        user: &UserId,
        amount: Money,
        notes: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        self.with_retry("withdrawal", || {
            self.try_cash_movement(user, TransactionType::Withdrawal, amount, notes.clone())
        })
        .await
    }

    // ── Internal ────────────────────────────────────────────────────

    async fn execute(
        &self,
        user: &UserId,
        request: &TradeRequest,
        side: TradeSide,
    ) -> Result<Transaction, LedgerError> {
        let label = match side {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        };
        let result = self
            .with_retry(label, || self.try_trade(user, request, side))
            .await;

        if let Err(e) = &result {
            if e.is_business_rule() {
                info!(user = %user, side = %side, asset = %request.asset, stage = %TradeStage::Rejected, error = %e, "trade rejected");
            } else {
                warn!(user = %user, side = %side, asset = %request.asset, stage = %TradeStage::Rejected, error = %e, "trade failed");
            }
        }
        result
    }

    async fn try_trade(
        &self,
        user: &UserId,
        request: &TradeRequest,
        side: TradeSide,
    ) -> Result<Transaction, LedgerError> {
        // ── Validated ──
        let quantity = request.quantity.ensure_positive("Quantity")?;
        let unit_price = request.unit_price.ensure_positive("Unit price")?;
        let portfolio = self.portfolios.tradable_portfolio(user, request.portfolio).await?;
        let asset = self.prices.get_asset(&request.asset).await?.id;
        let total_amount = quantity
            .value_at(unit_price)?
            .ensure_positive("Trade total")?;
        self.trace_stage(user, side, &asset, TradeStage::Validated);

        // ── Reserved ──
        let _locks = self
            .locks
            .acquire(vec![
                LockKey::Wallet(user.clone()),
                LockKey::Holding(portfolio.id, asset.clone()),
            ])
            .await?;
        self.trace_stage(user, side, &asset, TradeStage::Reserved);

        // ── Applied ──
        let mut wallet = self
            .store
            .get_or_create_wallet(user, &self.settings.default_currency)
            .await?;
        let existing = self.store.get_holding(portfolio.id, &asset).await?;

        let holding_change = match side {
            TradeSide::Buy => {
                wallet.debit(total_amount)?;
                let holding = self.holding_ledger.accumulate(
                    existing,
                    portfolio.id,
                    asset.clone(),
                    quantity,
                    unit_price,
                )?;
                HoldingChange::Upsert(holding)
            }
            TradeSide::Sell => {
                let outcome = self.holding_ledger.reduce(existing, &asset, quantity)?;
                wallet.credit(total_amount)?;
                outcome.into_change()
            }
        };
        self.trace_stage(user, side, &asset, TradeStage::Applied);

        // ── Logged ──
        let transaction = Transaction::trade(
            side.transaction_type(),
            user.clone(),
            portfolio.id,
            asset.clone(),
            quantity,
            unit_price,
            total_amount,
        );
        let balance_after = wallet.balance();
        self.store
            .commit(
                ChangeSet::new()
                    .with_wallet(wallet)
                    .with_holding(holding_change)
                    .with_transaction(transaction.clone()),
            )
            .await?;
        self.trace_stage(user, side, &asset, TradeStage::Logged);

        info!(
            user = %user,
            side = %side,
            portfolio = %portfolio.id,
            asset = %asset,
            quantity = %quantity,
            unit_price = %unit_price,
            total = %total_amount,
            balance = %balance_after,
            transaction = %transaction.id,
            "trade executed"
        );
        Ok(transaction)
    }

    async fn try_cash_movement(
        &self,
        user: &UserId,
        kind: TransactionType,
        amount: Money,
        notes: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        let amount = amount.ensure_positive("Amount")?;
        let _locks = self.locks.acquire(vec![LockKey::Wallet(user.clone())]).await?;

        let mut wallet = self
            .store
            .get_or_create_wallet(user, &self.settings.default_currency)
            .await?;
        match kind {
            TransactionType::Deposit => wallet.credit(amount)?,
            TransactionType::Withdrawal => wallet.debit(amount)?,
            other => {
                return Err(LedgerError::ValidationError(format!(
                    "{other} is not a wallet movement"
                )))
            }
        }

        let transaction = Transaction::cash(kind, user.clone(), amount, notes);
        let balance_after = wallet.balance();
        self.store
            .commit(
                ChangeSet::new()
                    .with_wallet(wallet)
                    .with_transaction(transaction.clone()),
            )
            .await?;

        info!(user = %user, kind = %kind, amount = %amount, balance = %balance_after, "wallet updated");
        Ok(transaction)
    }

    /// Run `op`, retrying only `ConcurrencyConflict`, at most
    /// `max_conflict_retries` extra times.
    async fn with_retry<T, F, Fut>(&self, label: &str, op: F) -> Result<T, LedgerError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let max_retries = self.settings.max_conflict_retries;
        let mut attempt = 0;
        loop {
            match op().await {
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    warn!(operation = label, attempt, max_retries, error = %e, "retrying after conflict");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                result => return result,
            }
        }
    }

    fn trace_stage(&self, user: &UserId, side: TradeSide, asset: &AssetId, stage: TradeStage) {
        debug!(user = %user, side = %side, asset = %asset, stage = %stage, "trade stage");
    }
}
