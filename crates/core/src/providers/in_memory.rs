use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

use super::traits::PriceSource;
use crate::errors::LedgerError;
use crate::models::asset::{Asset, AssetId};
use crate::models::money::Money;
use crate::models::price::MarketSnapshot;

#[derive(Debug, Clone)]
struct CatalogEntry {
    asset: Asset,
    snapshot: Option<MarketSnapshot>,
}

/// Catalog kept in process memory.
///
/// Publishing a new price moves the previous one into `reference_price`,
/// so percentage-change alerts compare against the last recorded price.
#[derive(Debug, Default)]
pub struct InMemoryPriceCatalog {
    entries: RwLock<HashMap<AssetId, CatalogEntry>>,
}

impl InMemoryPriceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset with its opening price.
    pub fn add_asset(&self, asset: Asset, price: Money) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            asset.id.clone(),
            CatalogEntry {
                asset,
                snapshot: Some(MarketSnapshot::new(price)),
            },
        );
    }

    /// Register an asset that has no published price yet.
    pub fn add_unpriced_asset(&self, asset: Asset) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(asset.id.clone(), CatalogEntry { asset, snapshot: None });
    }

    /// Publish a new price for a registered asset.
    pub fn set_price(&self, asset: &AssetId, price: Money) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries
            .get_mut(asset)
            .ok_or_else(|| LedgerError::NotFound(format!("asset {asset}")))?;

        let previous = entry.snapshot.take();
        let mut snapshot = MarketSnapshot::new(price);
        if let Some(prev) = previous {
            snapshot.reference_price = Some(prev.price);
            snapshot.volume = prev.volume;
        }
        entry.snapshot = Some(snapshot);
        Ok(())
    }

    /// Record the latest traded volume for a priced asset.
    pub fn set_volume(&self, asset: &AssetId, volume: Decimal) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries
            .get_mut(asset)
            .ok_or_else(|| LedgerError::NotFound(format!("asset {asset}")))?;
        let snapshot = entry
            .snapshot
            .as_mut()
            .ok_or_else(|| LedgerError::PriceNotAvailable(asset.to_string()))?;
        snapshot.volume = Some(volume);
        snapshot.as_of = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl PriceSource for InMemoryPriceCatalog {
    fn name(&self) -> &str {
        "InMemoryPriceCatalog"
    }

    async fn get_asset(&self, asset: &AssetId) -> Result<Asset, LedgerError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(asset)
            .map(|entry| entry.asset.clone())
            .ok_or_else(|| LedgerError::NotFound(format!("asset {asset}")))
    }

    async fn get_market_snapshot(&self, asset: &AssetId) -> Result<MarketSnapshot, LedgerError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries
            .get(asset)
            .ok_or_else(|| LedgerError::NotFound(format!("asset {asset}")))?;
        entry
            .snapshot
            .clone()
            .ok_or_else(|| LedgerError::PriceNotAvailable(asset.to_string()))
    }
}
