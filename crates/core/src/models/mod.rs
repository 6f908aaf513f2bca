pub mod alert;
pub mod analytics;
pub mod asset;
pub mod holding;
pub mod money;
pub mod portfolio;
pub mod price;
pub mod settings;
pub mod transaction;
pub mod user;
pub mod wallet;
