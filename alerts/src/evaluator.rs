use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::alert_store::AlertStore;
use crate::error::AlertError;
use crate::model::{Alert, TriggeredAlert};
use crate::triggered_log::TriggeredAlertLog;

/// Checks observed prices against live alerts and records each alert the
/// first time its condition holds.
///
/// Evaluations are serialized through `gate`: two observations racing for
/// the same alert cannot both pass the "not yet fired" check.
pub struct AlertEvaluator {
    alerts: Arc<AlertStore>,
    log: Arc<TriggeredAlertLog>,
    gate: Mutex<()>,
}

impl AlertEvaluator {
    pub fn new(alerts: Arc<AlertStore>, log: Arc<TriggeredAlertLog>) -> Self {
        Self {
            alerts,
            log,
            gate: Mutex::new(()),
        }
    }

    /// Evaluates one freshly observed price. Returns the new log entry when
    /// the asset's alert fires on this call.
    #[instrument(skip(self), target = "alerts")]
    pub async fn evaluate(
        &self,
        asset_id: &str,
        price: Decimal,
    ) -> Result<Option<TriggeredAlert>, AlertError> {
        let _gate = self.gate.lock().await;

        let Some(alert) = self.alerts.get(asset_id).await? else {
            return Ok(None);
        };
        self.check(&alert, price).await
    }

    /// Evaluates a batch of observed prices (e.g. a refreshed top list)
    /// against every live alert. Assets without a price in `prices` are
    /// skipped. Returns the alerts fired by this call, oldest alert first.
    #[instrument(skip(self, prices), target = "alerts", fields(observed = prices.len()))]
    pub async fn evaluate_many(
        &self,
        prices: &HashMap<String, Decimal>,
    ) -> Result<Vec<TriggeredAlert>, AlertError> {
        let _gate = self.gate.lock().await;

        let mut fired = Vec::new();
        for alert in self.alerts.list_all().await? {
            let Some(&price) = prices.get(&alert.asset_id) else {
                continue;
            };
            if let Some(t) = self.check(&alert, price).await? {
                fired.push(t);
            }
        }
        Ok(fired)
    }

    async fn check(
        &self,
        alert: &Alert,
        price: Decimal,
    ) -> Result<Option<TriggeredAlert>, AlertError> {
        if self.log.has_fired(alert.id).await? {
            debug!(alert_id = %alert.id, "alert already fired");
            return Ok(None);
        }
        if !alert.is_crossed_by(price) {
            return Ok(None);
        }

        let triggered = self.log.append(alert, price).await?;
        info!(
            alert_id = %alert.id,
            asset_id = %alert.asset_id,
            direction = %alert.direction,
            target = %alert.target_price,
            %price,
            "price alert triggered"
        );
        Ok(Some(triggered))
    }
}
