use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::alert::AlertPolicy;
use crate::errors::LedgerError;

/// Runtime configuration of the ledger.
///
/// Every field has a default, so a partial JSON document is enough:
/// `{"max_conflict_retries": 5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Currency assigned to wallets created lazily (e.g., "USD", "EUR").
    pub default_currency: String,

    /// How many times a trade is retried after lock contention before
    /// `ConcurrencyConflict` reaches the caller.
    pub max_conflict_retries: u32,

    /// Longest wait for a wallet or holding lock, in milliseconds.
    pub lock_timeout_ms: u64,

    pub alert_policy: AlertPolicy,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            default_currency: "USD".to_string(),
            max_conflict_retries: 3,
            lock_timeout_ms: 5_000,
            alert_policy: AlertPolicy::default(),
        }
    }
}

impl LedgerSettings {
    /// Parse settings from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        let settings: LedgerSettings = serde_json::from_str(json)?;
        settings.validated()
    }

    /// Normalize the currency code and check the remaining fields.
    pub fn validated(mut self) -> Result<Self, LedgerError> {
        let trimmed = self.default_currency.trim().to_uppercase();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(LedgerError::ValidationError(format!(
                "Invalid currency code '{}': must be exactly 3 ASCII letters (e.g., USD, EUR, PLN)",
                self.default_currency
            )));
        }
        if self.lock_timeout_ms == 0 {
            return Err(LedgerError::ValidationError(
                "lock_timeout_ms must be greater than zero".into(),
            ));
        }
        self.default_currency = trimmed;
        Ok(self)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
