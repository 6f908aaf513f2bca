use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::user::UserId;
use crate::errors::LedgerError;

/// A user's single cash balance.
///
/// `balance >= 0` holds at every observable point: the only mutators are
/// `credit` and `debit`, and `debit` refuses to overdraw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub user: UserId,

    balance: Money,

    /// ISO currency code, fixed at creation
    pub currency: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// An empty wallet, as created lazily on first access.
    pub fn new(user: UserId, currency: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user,
            balance: Money::ZERO,
            currency: currency.into().to_uppercase(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Add funds. Fails for a non-positive amount or a balance that would
    /// overflow; either way the balance is untouched.
    pub fn credit(&mut self, amount: Money) -> Result<(), LedgerError> {
        let amount = amount.ensure_positive("Credit amount")?;
        self.balance = self.balance.checked_add(amount).ok_or_else(|| {
            LedgerError::ValidationError(format!(
                "Balance overflow crediting {amount} to {}",
                self.balance
            ))
        })?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Remove funds if the balance covers them; otherwise the balance is untouched.
    pub fn debit(&mut self, amount: Money) -> Result<(), LedgerError> {
        let amount = amount.ensure_positive("Debit amount")?;
        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.updated_at = Utc::now();
        Ok(())
    }
}
