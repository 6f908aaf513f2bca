use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::AssetId;
use super::user::UserId;

/// Condition an alert watches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// price >= threshold
    PriceAbove,
    /// price <= threshold
    PriceBelow,
    /// |price - reference| / reference * 100 >= threshold
    PercentageChange,
    /// traded volume >= threshold
    VolumeAlert,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::PriceAbove => write!(f, "Price Above"),
            AlertType::PriceBelow => write!(f, "Price Below"),
            AlertType::PercentageChange => write!(f, "Percentage Change"),
            AlertType::VolumeAlert => write!(f, "Volume Alert"),
        }
    }
}

/// What happens to an alert once it fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// Fire once, then deactivate.
    #[default]
    DeactivateOnTrigger,
    /// Stay active and fire again on every evaluation that meets the condition.
    Repeat,
}

/// A user-defined threshold on one asset. Unique per (user, asset, alert type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentAlert {
    pub id: Uuid,

    pub user: UserId,

    pub asset: AssetId,

    pub alert_type: AlertType,

    /// A price, a percentage or a volume depending on `alert_type`
    pub threshold_value: Decimal,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub triggered_at: Option<DateTime<Utc>>,
}

impl InvestmentAlert {
    pub fn new(user: UserId, asset: AssetId, alert_type: AlertType, threshold_value: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            asset,
            alert_type,
            threshold_value,
            is_active: true,
            created_at: Utc::now(),
            triggered_at: None,
        }
    }
}
