use async_trait::async_trait;

use crate::errors::LedgerError;
use crate::models::asset::{Asset, AssetId};
use crate::models::money::Money;
use crate::models::price::MarketSnapshot;

/// Read-only view of the asset/price catalog.
///
/// The ledger only ever reads through this trait; prices are owned by the
/// surrounding system. Swap the implementation (database, market-data feed,
/// test double) without touching the services.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Look up a catalog entry. Unknown assets fail with `NotFound`.
    async fn get_asset(&self, asset: &AssetId) -> Result<Asset, LedgerError>;

    /// Price, reference price and volume for an asset.
    async fn get_market_snapshot(&self, asset: &AssetId) -> Result<MarketSnapshot, LedgerError>;

    /// Current price of an asset.
    async fn get_current_price(&self, asset: &AssetId) -> Result<Money, LedgerError> {
        Ok(self.get_market_snapshot(asset).await?.price)
    }
}
