use portfolio_ledger_core::errors::LedgerError;
use portfolio_ledger_core::models::alert::{AlertPolicy, AlertType, InvestmentAlert};
use portfolio_ledger_core::models::asset::{Asset, AssetId, AssetType};
use portfolio_ledger_core::models::holding::Holding;
use portfolio_ledger_core::models::money::{weighted_average_cost, Money, Quantity};
use portfolio_ledger_core::models::portfolio::{Portfolio, PortfolioId};
use portfolio_ledger_core::models::price::MarketSnapshot;
use portfolio_ledger_core::models::settings::LedgerSettings;
use portfolio_ledger_core::models::transaction::{Transaction, TransactionType};
use portfolio_ledger_core::models::user::UserId;
use portfolio_ledger_core::models::wallet::Wallet;
use rust_decimal_macros::dec;
use std::collections::HashSet;

fn money(v: rust_decimal::Decimal) -> Money {
    Money::new(v)
}

fn qty(v: rust_decimal::Decimal) -> Quantity {
    Quantity::new(v)
}

// ═══════════════════════════════════════════════════════════════════
// Money & Quantity
// ═══════════════════════════════════════════════════════════════════

mod money_and_quantity {
    use super::*;

    #[test]
    fn money_uses_bankers_rounding() {
        assert_eq!(money(dec!(2.345)).amount(), dec!(2.34));
        assert_eq!(money(dec!(2.355)).amount(), dec!(2.36));
        assert_eq!(money(dec!(0.125)).amount(), dec!(0.12));
    }

    #[test]
    fn quantity_keeps_six_digits() {
        assert_eq!(qty(dec!(0.1234565)).amount(), dec!(0.123456));
        assert_eq!(qty(dec!(0.1234575)).amount(), dec!(0.123458));
    }

    #[test]
    fn money_display_has_two_digits() {
        assert_eq!(money(dec!(1000)).to_string(), "1000.00");
        assert_eq!(money(dec!(-3.5)).to_string(), "-3.50");
    }

    #[test]
    fn quantity_display_is_normalized() {
        assert_eq!(qty(dec!(15.000000)).to_string(), "15");
        assert_eq!(qty(dec!(0.50)).to_string(), "0.5");
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(money(dec!(0.01)).ensure_positive("Amount").is_ok());
        assert!(matches!(
            Money::ZERO.ensure_positive("Amount"),
            Err(LedgerError::ValidationError(_))
        ));
        assert!(matches!(
            qty(dec!(-1)).ensure_positive("Quantity"),
            Err(LedgerError::ValidationError(_))
        ));
    }

    #[test]
    fn percent_of() {
        assert_eq!(money(dec!(15)).percent_of(money(dec!(60))), dec!(25));
        assert_eq!(money(dec!(1)).percent_of(money(dec!(3))), dec!(33.33));
        assert_eq!(money(dec!(10)).percent_of(Money::ZERO), dec!(0));
    }

    #[test]
    fn value_at_rounds_to_money_scale() {
        let value = qty(dec!(0.333333)).value_at(money(dec!(10))).unwrap();
        assert_eq!(value.amount(), dec!(3.33));
    }

    #[test]
    fn checked_sub_never_goes_negative() {
        assert_eq!(qty(dec!(10)).checked_sub(qty(dec!(4))), Some(qty(dec!(6))));
        assert_eq!(qty(dec!(10)).checked_sub(qty(dec!(10))), Some(Quantity::ZERO));
        assert_eq!(qty(dec!(10)).checked_sub(qty(dec!(10.000001))), None);
    }

    #[test]
    fn weighted_average_blends_lots() {
        let avg = weighted_average_cost(qty(dec!(10)), money(dec!(50)), qty(dec!(5)), money(dec!(80)))
            .unwrap();
        assert_eq!(avg.amount(), dec!(60));
    }

    #[test]
    fn weighted_average_rounds_once() {
        // 30.02 / 3 = 10.00666...
        let avg = weighted_average_cost(qty(dec!(1)), money(dec!(10)), qty(dec!(2)), money(dec!(10.01)))
            .unwrap();
        assert_eq!(avg.amount(), dec!(10.01));
    }

    #[test]
    fn weighted_average_of_nothing_is_an_error() {
        assert!(weighted_average_cost(Quantity::ZERO, Money::ZERO, Quantity::ZERO, money(dec!(1))).is_err());
    }

    #[test]
    fn money_sum_and_arithmetic() {
        let total: Money = vec![money(dec!(1.10)), money(dec!(2.20)), money(dec!(3.30))]
            .into_iter()
            .sum();
        assert_eq!(total.amount(), dec!(6.60));
        assert_eq!((money(dec!(5)) - money(dec!(7))).amount(), dec!(-2));
        assert_eq!((-money(dec!(5))).abs(), money(dec!(5)));
    }

    #[test]
    fn checked_addition_reports_overflow() {
        let max = Money::new(rust_decimal::Decimal::MAX);
        assert_eq!(money(dec!(1.25)).checked_add(money(dec!(2))), Some(money(dec!(3.25))));
        assert_eq!(max.checked_add(money(dec!(1))), None);

        let big = Quantity::new(rust_decimal::Decimal::MAX);
        assert_eq!(qty(dec!(0.5)).checked_add(qty(dec!(0.25))), Some(qty(dec!(0.75))));
        assert_eq!(big.checked_add(qty(dec!(1))), None);
    }

    #[test]
    fn try_sum_fails_instead_of_panicking() {
        assert_eq!(
            Money::try_sum([money(dec!(1.10)), money(dec!(2.20))]).unwrap(),
            money(dec!(3.30))
        );
        assert_eq!(Money::try_sum(Vec::<Money>::new()).unwrap(), Money::ZERO);

        let max = Money::new(rust_decimal::Decimal::MAX);
        assert!(matches!(
            Money::try_sum([max, money(dec!(1))]),
            Err(LedgerError::ValidationError(_))
        ));
    }

    #[test]
    fn serde_round_trip() {
        let m = money(dec!(12.34));
        let json = serde_json::to_string(&m).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Asset
// ═══════════════════════════════════════════════════════════════════

mod asset {
    use super::*;

    #[test]
    fn id_is_trimmed_and_uppercased() {
        assert_eq!(AssetId::new(" aapl ").as_str(), "AAPL");
        assert_eq!(AssetId::from("btc"), AssetId::new("BTC"));
    }

    #[test]
    fn equality_is_by_id_only() {
        let a = Asset::stock("AAPL", "Apple Inc.");
        let b = Asset::new("aapl", "Apple", AssetType::Other);
        assert_eq!(a, b);

        let set: HashSet<Asset> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn asset_type_display() {
        assert_eq!(AssetType::Crypto.to_string(), "Cryptocurrency");
        assert_eq!(AssetType::RealEstate.to_string(), "Real Estate");
        assert_eq!(AssetType::Forex.to_string(), "Foreign Exchange");
    }

    #[test]
    fn asset_type_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&AssetType::RealEstate).unwrap(), "\"real_estate\"");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Wallet
// ═══════════════════════════════════════════════════════════════════

mod wallet {
    use super::*;

    #[test]
    fn new_wallet_is_empty() {
        let wallet = Wallet::new(UserId::new("alice"), "usd");
        assert_eq!(wallet.balance(), Money::ZERO);
        assert_eq!(wallet.currency, "USD");
    }

    #[test]
    fn credit_then_debit() {
        let mut wallet = Wallet::new(UserId::new("alice"), "USD");
        wallet.credit(money(dec!(1000))).unwrap();
        wallet.debit(money(dec!(500))).unwrap();
        assert_eq!(wallet.balance().amount(), dec!(500));
    }

    #[test]
    fn debit_beyond_balance_leaves_it_untouched() {
        let mut wallet = Wallet::new(UserId::new("alice"), "USD");
        wallet.credit(money(dec!(100))).unwrap();

        let err = wallet.debit(money(dec!(150))).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                required: money(dec!(150)),
                available: money(dec!(100)),
            }
        );
        assert_eq!(wallet.balance().amount(), dec!(100));
    }

    #[test]
    fn debit_of_exact_balance_reaches_zero() {
        let mut wallet = Wallet::new(UserId::new("alice"), "USD");
        wallet.credit(money(dec!(42.50))).unwrap();
        wallet.debit(money(dec!(42.50))).unwrap();
        assert!(wallet.balance().is_zero());
    }

    #[test]
    fn credit_overflow_leaves_balance_untouched() {
        let max = Money::new(rust_decimal::Decimal::MAX);
        let mut wallet = Wallet::new(UserId::new("alice"), "USD");
        wallet.credit(max).unwrap();

        let err = wallet.credit(money(dec!(1))).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationError(_)));
        assert_eq!(wallet.balance(), max);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let mut wallet = Wallet::new(UserId::new("alice"), "USD");
        assert!(matches!(wallet.credit(Money::ZERO), Err(LedgerError::ValidationError(_))));
        assert!(matches!(
            wallet.debit(money(dec!(-5))),
            Err(LedgerError::ValidationError(_))
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Holding
// ═══════════════════════════════════════════════════════════════════

mod holding {
    use super::*;

    #[test]
    fn derived_values() {
        let h = Holding::new(PortfolioId::new(), AssetId::new("AAPL"), qty(dec!(10)), money(dec!(50)));
        let price = money(dec!(70));
        assert_eq!(h.total_value(price).unwrap().amount(), dec!(700));
        assert_eq!(h.total_cost().unwrap().amount(), dec!(500));
        assert_eq!(h.profit_loss(price).unwrap().amount(), dec!(200));
        assert_eq!(h.profit_loss_percent(price).unwrap(), dec!(40));
    }

    #[test]
    fn loss_is_negative() {
        let h = Holding::new(PortfolioId::new(), AssetId::new("AAPL"), qty(dec!(4)), money(dec!(25)));
        let price = money(dec!(20));
        assert_eq!(h.profit_loss(price).unwrap().amount(), dec!(-20));
        assert_eq!(h.profit_loss_percent(price).unwrap(), dec!(-20));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Portfolio & Transaction
// ═══════════════════════════════════════════════════════════════════

mod portfolio {
    use super::*;

    #[test]
    fn new_portfolio_is_active_with_trimmed_name() {
        let p = Portfolio::new(UserId::new("alice"), "  Retirement ", None);
        assert!(p.is_active);
        assert_eq!(p.name, "Retirement");
        assert!(p.is_owned_by(&UserId::new("alice")));
        assert!(!p.is_owned_by(&UserId::new("bob")));
    }

    #[test]
    fn deactivate() {
        let mut p = Portfolio::new(UserId::new("alice"), "Main", None);
        p.deactivate();
        assert!(!p.is_active);
    }
}

mod transaction {
    use super::*;

    #[test]
    fn trade_record_carries_all_fields() {
        let portfolio = PortfolioId::new();
        let tx = Transaction::trade(
            TransactionType::Buy,
            UserId::new("alice"),
            portfolio,
            AssetId::new("AAPL"),
            qty(dec!(10)),
            money(dec!(50)),
            money(dec!(500)),
        );
        assert!(tx.is_trade());
        assert_eq!(tx.portfolio, Some(portfolio));
        assert_eq!(tx.wallet, tx.user);
        assert_eq!(tx.total_amount.amount(), dec!(500));
    }

    #[test]
    fn cash_record_has_no_asset() {
        let tx = Transaction::cash(
            TransactionType::Deposit,
            UserId::new("alice"),
            money(dec!(100)),
            Some("salary".into()),
        );
        assert!(!tx.is_trade());
        assert!(tx.asset.is_none());
        assert!(tx.portfolio.is_none());
        assert_eq!(tx.notes.as_deref(), Some("salary"));
    }

    #[test]
    fn type_display_and_serde() {
        assert_eq!(TransactionType::Withdrawal.to_string(), "withdrawal");
        assert_eq!(serde_json::to_string(&TransactionType::Sell).unwrap(), "\"sell\"");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Alerts & Market Data
// ═══════════════════════════════════════════════════════════════════

mod alert {
    use super::*;

    #[test]
    fn new_alert_is_active_and_untriggered() {
        let alert = InvestmentAlert::new(
            UserId::new("alice"),
            AssetId::new("BTC"),
            AlertType::PriceAbove,
            dec!(50000),
        );
        assert!(alert.is_active);
        assert!(alert.triggered_at.is_none());
    }

    #[test]
    fn alert_type_display() {
        assert_eq!(AlertType::PercentageChange.to_string(), "Percentage Change");
        assert_eq!(AlertType::VolumeAlert.to_string(), "Volume Alert");
    }

    #[test]
    fn default_policy_deactivates() {
        assert_eq!(AlertPolicy::default(), AlertPolicy::DeactivateOnTrigger);
    }
}

mod market_snapshot {
    use super::*;

    #[test]
    fn percentage_change_is_absolute() {
        let up = MarketSnapshot::new(money(dec!(110))).with_reference(money(dec!(100)));
        let down = MarketSnapshot::new(money(dec!(90))).with_reference(money(dec!(100)));
        assert_eq!(up.percentage_change(), Some(dec!(10)));
        assert_eq!(down.percentage_change(), Some(dec!(10)));
    }

    #[test]
    fn threshold_check_uses_the_exact_move() {
        // 200.00 -> 209.99 is 4.995%, displayed as 5.00
        let just_under = MarketSnapshot::new(money(dec!(209.99))).with_reference(money(dec!(200)));
        assert_eq!(just_under.percentage_change(), Some(dec!(5.00)));
        assert!(!just_under.moved_at_least(dec!(5)));
        assert!(just_under.moved_at_least(dec!(4.995)));

        let exact = MarketSnapshot::new(money(dec!(210))).with_reference(money(dec!(200)));
        assert!(exact.moved_at_least(dec!(5)));

        let down = MarketSnapshot::new(money(dec!(190))).with_reference(money(dec!(200)));
        assert!(down.moved_at_least(dec!(5)));
        assert!(!down.moved_at_least(dec!(5.01)));
    }

    #[test]
    fn no_usable_reference() {
        assert_eq!(MarketSnapshot::new(money(dec!(110))).percentage_change(), None);
        let zero_ref = MarketSnapshot::new(money(dec!(110))).with_reference(Money::ZERO);
        assert_eq!(zero_ref.percentage_change(), None);
        assert!(!zero_ref.moved_at_least(dec!(1)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    #[test]
    fn defaults() {
        let s = LedgerSettings::default();
        assert_eq!(s.default_currency, "USD");
        assert_eq!(s.max_conflict_retries, 3);
        assert_eq!(s.lock_timeout().as_millis(), 5_000);
        assert_eq!(s.alert_policy, AlertPolicy::DeactivateOnTrigger);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s = LedgerSettings::from_json(r#"{"max_conflict_retries": 5, "default_currency": "eur"}"#)
            .unwrap();
        assert_eq!(s.max_conflict_retries, 5);
        assert_eq!(s.default_currency, "EUR");
        assert_eq!(s.lock_timeout_ms, 5_000);
    }

    #[test]
    fn alert_policy_from_json() {
        let s = LedgerSettings::from_json(r#"{"alert_policy": "repeat"}"#).unwrap();
        assert_eq!(s.alert_policy, AlertPolicy::Repeat);
    }

    #[test]
    fn invalid_currency_rejected() {
        let err = LedgerSettings::from_json(r#"{"default_currency": "EURO"}"#).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationError(_)));
    }

    #[test]
    fn zero_lock_timeout_rejected() {
        let err = LedgerSettings::from_json(r#"{"lock_timeout_ms": 0}"#).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationError(_)));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = LedgerSettings::from_json("{").unwrap_err();
        assert!(matches!(err, LedgerError::Serialization(_)));
    }
}
