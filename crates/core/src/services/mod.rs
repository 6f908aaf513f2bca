pub mod alert_service;
pub mod holding_ledger;
pub mod lock_table;
pub mod portfolio_service;
pub mod trade_executor;
pub mod transaction_log;
pub mod valuation_service;
