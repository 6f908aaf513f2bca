use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::AssetId;
use super::money::{Money, Quantity};
use super::portfolio::PortfolioId;
use super::user::UserId;

/// Kind of balance-affecting operation recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Buy,
    Sell,
    Deposit,
    Withdrawal,
    /// Recorded by the surrounding system; the executor never emits it.
    Transfer,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "buy"),
            TransactionType::Sell => write!(f, "sell"),
            TransactionType::Deposit => write!(f, "deposit"),
            TransactionType::Withdrawal => write!(f, "withdrawal"),
            TransactionType::Transfer => write!(f, "transfer"),
        }
    }
}

/// Immutable record of one executed operation.
///
/// Created exactly once by the trade executor and never mutated or deleted;
/// the log of these records is the audit trail and the source for
/// reconstructing positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,

    pub user: UserId,

    pub transaction_type: TransactionType,

    #[serde(default)]
    pub asset: Option<AssetId>,

    #[serde(default)]
    pub quantity: Option<Quantity>,

    #[serde(default)]
    pub price_per_unit: Option<Money>,

    /// Always positive
    pub total_amount: Money,

    #[serde(default)]
    pub portfolio: Option<PortfolioId>,

    /// The wallet involved, identified by its owner
    pub wallet: UserId,

    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl Transaction {
    /// A buy or sell of `quantity` units at `price_per_unit`.
    pub fn trade(
        transaction_type: TransactionType,
        user: UserId,
        portfolio: PortfolioId,
        asset: AssetId,
        quantity: Quantity,
        price_per_unit: Money,
        total_amount: Money,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet: user.clone(),
            user,
            transaction_type,
            asset: Some(asset),
            quantity: Some(quantity),
            price_per_unit: Some(price_per_unit),
            total_amount,
            portfolio: Some(portfolio),
            timestamp: Utc::now(),
            notes: None,
        }
    }

    /// A deposit or withdrawal that touches only the wallet.
    pub fn cash(
        transaction_type: TransactionType,
        user: UserId,
        total_amount: Money,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet: user.clone(),
            user,
            transaction_type,
            asset: None,
            quantity: None,
            price_per_unit: None,
            total_amount,
            portfolio: None,
            timestamp: Utc::now(),
            notes,
        }
    }

    pub fn is_trade(&self) -> bool {
        matches!(
            self.transaction_type,
            TransactionType::Buy | TransactionType::Sell
        )
    }
}
