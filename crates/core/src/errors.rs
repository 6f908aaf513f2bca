use thiserror::Error;

use crate::models::money::{Money, Quantity};

/// Unified error type for the portfolio ledger core.
/// Every public fallible function returns `Result<T, LedgerError>`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    // ── Business Rules ──────────────────────────────────────────────
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Money, available: Money },

    #[error("Insufficient holding of {asset}: requested {requested}, available {available}")]
    InsufficientHolding {
        asset: String,
        requested: Quantity,
        available: Quantity,
    },

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ── Concurrency / Persistence ───────────────────────────────────
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    // ── Collaborators ───────────────────────────────────────────────
    #[error("Price not available for {0}")]
    PriceNotAvailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Only lock contention is safe to retry; everything else is reported as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ConcurrencyConflict(_))
    }

    /// Expected rejections that are reported verbatim to the caller.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            LedgerError::InsufficientFunds { .. }
                | LedgerError::InsufficientHolding { .. }
                | LedgerError::ValidationError(_)
                | LedgerError::NotFound(_)
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}
