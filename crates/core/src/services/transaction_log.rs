use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::errors::LedgerError;
use crate::models::asset::AssetId;
use crate::models::holding::Holding;
use crate::models::money::{Money, Quantity};
use crate::models::portfolio::PortfolioId;
use crate::models::transaction::{Transaction, TransactionType};
use crate::services::holding_ledger::{HoldingLedger, ReduceOutcome};

/// Optional criteria for narrowing a transaction listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub portfolio: Option<PortfolioId>,
    pub asset: Option<AssetId>,
    pub transaction_type: Option<TransactionType>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.portfolio.map_or(true, |p| tx.portfolio == Some(p))
            && self.asset.as_ref().map_or(true, |a| tx.asset.as_ref() == Some(a))
            && self.transaction_type.map_or(true, |t| tx.transaction_type == t)
    }
}

/// Read side of the append-only transaction log.
///
/// The log is the audit trail: positions and realized profit/loss can be
/// rebuilt from it alone, using the same accounting rules as live trading.
pub struct TransactionLog {
    holding_ledger: HoldingLedger,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self {
            holding_ledger: HoldingLedger::new(),
        }
    }

    /// Apply `filter` and order newest first (for display).
    pub fn query(&self, transactions: Vec<Transaction>, filter: &TransactionFilter) -> Vec<Transaction> {
        let mut matching: Vec<Transaction> = transactions
            .into_iter()
            .filter(|tx| filter.matches(tx))
            .collect();
        // stable: equal timestamps keep reverse commit order
        matching.reverse();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching
    }

    /// Rebuild every (portfolio, asset) position by replaying buys and sells
    /// in commit order. Cash movements are ignored.
    pub fn replay_holdings(
        &self,
        transactions: &[Transaction],
    ) -> Result<BTreeMap<(PortfolioId, AssetId), Holding>, LedgerError> {
        let mut positions = BTreeMap::new();
        for tx in transactions.iter().filter(|tx| tx.is_trade()) {
            self.apply(&mut positions, tx)?;
        }
        Ok(positions)
    }

    /// Profit/loss booked by sells: Σ (sell price - average cost at sale) × quantity.
    pub fn realized_profit_loss(&self, transactions: &[Transaction]) -> Result<Money, LedgerError> {
        let mut positions: BTreeMap<(PortfolioId, AssetId), Holding> = BTreeMap::new();
        let mut realized = Money::ZERO;

        for tx in transactions.iter().filter(|tx| tx.is_trade()) {
            if tx.transaction_type == TransactionType::Sell {
                let (portfolio, asset, quantity, price) = Self::trade_fields(tx)?;
                let average_cost = positions
                    .get(&(portfolio, asset.clone()))
                    .map(|h| h.average_cost)
                    .unwrap_or(Money::ZERO);
                let booked = quantity.value_at(price)? - quantity.value_at(average_cost)?;
                realized = Money::try_sum([realized, booked])?;
            }
            self.apply(&mut positions, tx)?;
        }
        Ok(realized)
    }

    /// Export transactions as pretty-printed JSON.
    pub fn export_json(&self, transactions: &[Transaction]) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(transactions).map_err(|e| {
            LedgerError::Serialization(format!("Failed to serialize transactions to JSON: {e}"))
        })
    }

    /// Export transactions as CSV.
    /// Columns: id, timestamp, type, portfolio, asset, quantity, price_per_unit, total_amount, notes
    pub fn export_csv(&self, transactions: &[Transaction]) -> String {
        let mut csv = String::from(
            "id,timestamp,type,portfolio,asset,quantity,price_per_unit,total_amount,notes\n",
        );
        for tx in transactions {
            let asset = tx.asset.as_ref().map(|a| a.to_string()).unwrap_or_default();
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{}\n",
                tx.id,
                tx.timestamp.to_rfc3339(),
                csv_field(&tx.transaction_type.to_string()),
                tx.portfolio.map(|p| p.to_string()).unwrap_or_default(),
                csv_field(&asset),
                tx.quantity.map(|q| q.to_string()).unwrap_or_default(),
                tx.price_per_unit.map(|p| p.to_string()).unwrap_or_default(),
                tx.total_amount,
                csv_field(tx.notes.as_deref().unwrap_or("")),
            ));
        }
        csv
    }

    fn apply(
        &self,
        positions: &mut BTreeMap<(PortfolioId, AssetId), Holding>,
        tx: &Transaction,
    ) -> Result<(), LedgerError> {
        let (portfolio, asset, quantity, price) = Self::trade_fields(tx)?;
        let key = (portfolio, asset.clone());
        let existing = positions.remove(&key);

        match tx.transaction_type {
            TransactionType::Buy => {
                let holding = self
                    .holding_ledger
                    .accumulate(existing, portfolio, asset, quantity, price)?;
                positions.insert(key, holding);
            }
            TransactionType::Sell => {
                if let ReduceOutcome::Remaining(holding) =
                    self.holding_ledger.reduce(existing, &asset, quantity)?
                {
                    positions.insert(key, holding);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn trade_fields(
        tx: &Transaction,
    ) -> Result<(PortfolioId, AssetId, Quantity, Money), LedgerError> {
        match (tx.portfolio, &tx.asset, tx.quantity, tx.price_per_unit) {
            (Some(portfolio), Some(asset), Some(quantity), Some(price)) => {
                Ok((portfolio, asset.clone(), quantity, price))
            }
            _ => Err(LedgerError::ValidationError(format!(
                "{} transaction {} is missing portfolio, asset, quantity or price",
                tx.transaction_type, tx.id
            ))),
        }
    }
}

/// Quote a field containing commas, quotes, or line breaks; inner quotes are doubled.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::new()
    }
}
