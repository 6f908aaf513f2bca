use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::models::alert::{AlertPolicy, AlertType, InvestmentAlert};
use crate::models::asset::AssetId;
use crate::models::price::MarketSnapshot;
use crate::models::user::UserId;
use crate::providers::traits::PriceSource;
use crate::storage::traits::LedgerStore;

/// Manages threshold alerts and evaluates them against catalog prices.
pub struct AlertService {
    store: Arc<dyn LedgerStore>,
    prices: Arc<dyn PriceSource>,
    policy: AlertPolicy,
}

impl AlertService {
    pub fn new(store: Arc<dyn LedgerStore>, prices: Arc<dyn PriceSource>, policy: AlertPolicy) -> Self {
        Self {
            store,
            prices,
            policy,
        }
    }

    /// Create an active alert. At most one alert per (user, asset, type).
    pub async fn create_alert(
        &self,
        user: &UserId,
        asset: &AssetId,
        alert_type: AlertType,
        threshold_value: Decimal,
    ) -> Result<InvestmentAlert, LedgerError> {
        if threshold_value <= Decimal::ZERO {
            return Err(LedgerError::ValidationError(format!(
                "Alert threshold must be positive, got {threshold_value}"
            )));
        }
        let asset = self.prices.get_asset(asset).await?.id;

        let existing = self.store.list_alerts(user).await?;
        if existing
            .iter()
            .any(|a| a.asset == asset && a.alert_type == alert_type)
        {
            return Err(LedgerError::ValidationError(format!(
                "A {alert_type} alert for {asset} already exists"
            )));
        }

        let alert = InvestmentAlert::new(user.clone(), asset, alert_type, threshold_value);
        self.store.save_alert(alert.clone()).await?;
        info!(user = %user, asset = %alert.asset, alert_type = %alert_type, threshold = %threshold_value, "alert created");
        Ok(alert)
    }

    /// Delete one of the user's alerts.
    pub async fn remove_alert(&self, user: &UserId, id: Uuid) -> Result<(), LedgerError> {
        self.owned_alert(user, id).await?;
        self.store.delete_alert(id).await?;
        Ok(())
    }

    /// Turn an alert on or off. Re-enabling keeps the last `triggered_at`.
    pub async fn set_alert_active(
        &self,
        user: &UserId,
        id: Uuid,
        active: bool,
    ) -> Result<InvestmentAlert, LedgerError> {
        self.owned_alert(user, id).await?;
        self.store
            .update_alert_active(id, active)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("alert {id}")))
    }

    pub async fn list_alerts(&self, user: &UserId) -> Result<Vec<InvestmentAlert>, LedgerError> {
        self.store.list_alerts(user).await
    }

    /// Check every active alert of the user against current market data.
    ///
    /// Triggered alerts get `triggered_at = now`; under
    /// `AlertPolicy::DeactivateOnTrigger` they are also switched off.
    /// Returns the alerts that fired in this pass. Assets whose market data
    /// cannot be read are skipped, not fatal.
    pub async fn evaluate_alerts(&self, user: &UserId) -> Result<Vec<InvestmentAlert>, LedgerError> {
        let alerts = self.store.user_snapshot(user).await?.alerts;
        let mut snapshots: HashMap<AssetId, Option<MarketSnapshot>> = HashMap::new();
        let mut triggered = Vec::new();

        for alert in alerts.into_iter().filter(|a| a.is_active) {
            if !snapshots.contains_key(&alert.asset) {
                let snapshot = match self.prices.get_market_snapshot(&alert.asset).await {
                    Ok(snapshot) => Some(snapshot),
                    Err(e) => {
                        warn!(asset = %alert.asset, error = %e, "skipping alerts without market data");
                        None
                    }
                };
                snapshots.insert(alert.asset.clone(), snapshot);
            }
            let Some(Some(snapshot)) = snapshots.get(&alert.asset) else {
                continue;
            };

            if !Self::is_triggered(&alert, snapshot) {
                continue;
            }

            // Fires only if still active in the store; another pass may have won.
            let deactivate = self.policy == AlertPolicy::DeactivateOnTrigger;
            let Some(alert) = self
                .store
                .mark_alert_triggered(alert.id, Utc::now(), deactivate)
                .await?
            else {
                continue;
            };
            info!(
                user = %user,
                asset = %alert.asset,
                alert_type = %alert.alert_type,
                threshold = %alert.threshold_value,
                price = %snapshot.price,
                "alert triggered"
            );
            triggered.push(alert);
        }

        Ok(triggered)
    }

    /// Trigger condition for one alert against one market snapshot.
    pub fn is_triggered(alert: &InvestmentAlert, snapshot: &MarketSnapshot) -> bool {
        let threshold = alert.threshold_value;
        match alert.alert_type {
            AlertType::PriceAbove => snapshot.price.amount() >= threshold,
            AlertType::PriceBelow => snapshot.price.amount() <= threshold,
            AlertType::PercentageChange => snapshot.moved_at_least(threshold),
            AlertType::VolumeAlert => snapshot.volume.is_some_and(|volume| volume >= threshold),
        }
    }

    async fn owned_alert(&self, user: &UserId, id: Uuid) -> Result<InvestmentAlert, LedgerError> {
        self.store
            .get_alert(id)
            .await?
            .filter(|a| &a.user == user)
            .ok_or_else(|| LedgerError::NotFound(format!("alert {id}")))
    }
}
