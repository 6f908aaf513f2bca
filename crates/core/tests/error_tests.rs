// ═══════════════════════════════════════════════════════════════════
// Error Tests: LedgerError variants, Display formatting, classification
// ═══════════════════════════════════════════════════════════════════

use portfolio_ledger_core::errors::LedgerError;
use portfolio_ledger_core::models::money::{Money, Quantity};
use rust_decimal_macros::dec;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn insufficient_funds() {
        let err = LedgerError::InsufficientFunds {
            required: Money::new(dec!(150)),
            available: Money::new(dec!(100)),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: required 150.00, available 100.00"
        );
    }

    #[test]
    fn insufficient_holding() {
        let err = LedgerError::InsufficientHolding {
            asset: "AAPL".into(),
            requested: Quantity::new(dec!(10)),
            available: Quantity::new(dec!(2.5)),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient holding of AAPL: requested 10, available 2.5"
        );
    }

    #[test]
    fn validation_error() {
        let err = LedgerError::ValidationError("Quantity must be positive".into());
        assert_eq!(err.to_string(), "Validation failed: Quantity must be positive");
    }

    #[test]
    fn not_found() {
        let err = LedgerError::NotFound("asset XYZ".into());
        assert_eq!(err.to_string(), "Not found: asset XYZ");
    }

    #[test]
    fn concurrency_conflict() {
        let err = LedgerError::ConcurrencyConflict("timed out".into());
        assert_eq!(err.to_string(), "Concurrency conflict: timed out");
    }

    #[test]
    fn persistence_failure() {
        let err = LedgerError::PersistenceFailure("disk full".into());
        assert_eq!(err.to_string(), "Persistence failure: disk full");
    }

    #[test]
    fn price_not_available() {
        let err = LedgerError::PriceNotAvailable("BTC".into());
        assert_eq!(err.to_string(), "Price not available for BTC");
    }

    #[test]
    fn serialization() {
        let err = LedgerError::Serialization("unexpected EOF".into());
        assert_eq!(err.to_string(), "Serialization error: unexpected EOF");
    }
}

// ── Classification ──────────────────────────────────────────────────

mod classification {
    use super::*;

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(LedgerError::ConcurrencyConflict("x".into()).is_retryable());
        assert!(!LedgerError::PersistenceFailure("x".into()).is_retryable());
        assert!(!LedgerError::ValidationError("x".into()).is_retryable());
        assert!(!LedgerError::InsufficientFunds {
            required: Money::new(dec!(1)),
            available: Money::ZERO,
        }
        .is_retryable());
    }

    #[test]
    fn business_rules() {
        assert!(LedgerError::NotFound("x".into()).is_business_rule());
        assert!(LedgerError::ValidationError("x".into()).is_business_rule());
        assert!(LedgerError::InsufficientHolding {
            asset: "A".into(),
            requested: Quantity::new(dec!(1)),
            available: Quantity::ZERO,
        }
        .is_business_rule());
        assert!(!LedgerError::PersistenceFailure("x".into()).is_business_rule());
        assert!(!LedgerError::ConcurrencyConflict("x".into()).is_business_rule());
        assert!(!LedgerError::PriceNotAvailable("x".into()).is_business_rule());
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod from_impls {
    use super::*;

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: LedgerError = json_err.into();
        assert!(matches!(err, LedgerError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error: "));
    }
}

// ── std::error::Error ───────────────────────────────────────────────

mod std_error {
    use super::*;

    #[test]
    fn boxes_as_dyn_error() {
        let err: Box<dyn std::error::Error> = Box::new(LedgerError::NotFound("portfolio".into()));
        assert_eq!(err.to_string(), "Not found: portfolio");
    }

    #[test]
    fn clone_and_eq() {
        let err = LedgerError::ValidationError("bad".into());
        assert_eq!(err.clone(), err);
    }
}
