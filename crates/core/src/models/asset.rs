use serde::{Deserialize, Serialize};

/// Category of a catalog asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Stock,
    Bond,
    Crypto,
    RealEstate,
    Commodity,
    Forex,
    Other,
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Stock => write!(f, "Stock"),
            AssetType::Bond => write!(f, "Bond"),
            AssetType::Crypto => write!(f, "Cryptocurrency"),
            AssetType::RealEstate => write!(f, "Real Estate"),
            AssetType::Commodity => write!(f, "Commodity"),
            AssetType::Forex => write!(f, "Foreign Exchange"),
            AssetType::Other => write!(f, "Other"),
        }
    }
}

/// Identity of an asset inside the ledger: its upper-cased ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(symbol: &str) -> Self {
        AssetId::new(symbol)
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A read-only catalog entry. The ledger never writes assets or prices.
///
/// **Equality and hashing** are based solely on `id`, NOT on `name`
/// or `asset_type`, so lookups stay stable whatever display data the
/// catalog returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,

    /// Human-readable name (e.g., "Apple Inc.")
    pub name: String,

    pub asset_type: AssetType,
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Asset {}

impl std::hash::Hash for Asset {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Asset {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            id: AssetId::new(symbol),
            name: name.into(),
            asset_type,
        }
    }

    pub fn stock(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(symbol, name, AssetType::Stock)
    }

    pub fn crypto(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(symbol, name, AssetType::Crypto)
    }
}
