use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{Instrument, debug, instrument, warn};

use alerts::store::KeyValueStore;
use alerts::{
    Alert, AlertError, AlertEvaluator, AlertId, AlertStore, Direction, TriggeredAlert,
    TriggeredAlertLog, parse_target_price,
};
use common::clock::Clock;
use common::logger::child_span;
use market::types::{ChartDataPoint, ChartWindow, Cryptocurrency, CryptocurrencyDetail};
use market::{MarketDataService, MarketError, Observation};

/// A market read together with the alerts it fired.
#[derive(Debug)]
pub struct Refreshed<V> {
    pub observation: Observation<V>,
    pub fired: Vec<TriggeredAlert>,
}

/// Service wiring shared by every command. Constructed once per process.
pub struct App {
    market: Arc<MarketDataService>,
    alerts: Arc<AlertStore>,
    log: Arc<TriggeredAlertLog>,
    evaluator: Arc<AlertEvaluator>,
}

impl App {
    pub fn new(
        market: Arc<MarketDataService>,
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let alerts = Arc::new(AlertStore::new(Arc::clone(&kv), Arc::clone(&clock)));
        let log = Arc::new(TriggeredAlertLog::new(kv, clock));
        let evaluator = Arc::new(AlertEvaluator::new(Arc::clone(&alerts), Arc::clone(&log)));

        Self {
            market,
            alerts,
            log,
            evaluator,
        }
    }

    /// Top list. A live fetch evaluates every listed asset at once.
    #[instrument(skip(self), target = "app")]
    pub async fn top(&self) -> Result<Refreshed<Vec<Cryptocurrency>>, MarketError> {
        let observation = self.market.top_cryptocurrencies().await?;

        let fired = if observation.is_live() {
            let prices: HashMap<String, Decimal> = observation
                .value
                .iter()
                .map(|c| (c.id.clone(), c.current_price))
                .collect();
            fired_or_warn(self.evaluator.evaluate_many(&prices).await)
        } else {
            debug!(freshness = ?observation.freshness, "top list not live; skipping evaluation");
            Vec::new()
        };

        Ok(Refreshed { observation, fired })
    }

    /// Detail view. A live fetch evaluates the alert for this asset.
    #[instrument(skip(self), target = "app")]
    pub async fn detail(
        &self,
        asset_id: &str,
    ) -> Result<Refreshed<CryptocurrencyDetail>, MarketError> {
        let observation = self.market.detail(asset_id).await?;

        let fired = if observation.is_live() {
            let price = observation.value.current_price;
            let res = self.evaluator.evaluate(asset_id, price).await;
            fired_or_warn(res.map(|t| t.into_iter().collect()))
        } else {
            Vec::new()
        };

        Ok(Refreshed { observation, fired })
    }

    pub async fn chart(
        &self,
        asset_id: &str,
        window: ChartWindow,
    ) -> Result<Observation<Vec<ChartDataPoint>>, MarketError> {
        self.market.chart(asset_id, window.days()).await
    }

    /// Creates or replaces the alert for `asset_id`. When no display name is
    /// given, the asset's detail name is used if it can be fetched.
    pub async fn set_alert(
        &self,
        asset_id: &str,
        name: Option<String>,
        price_text: &str,
        direction: Direction,
    ) -> Result<Alert, AlertError> {
        let target_price = parse_target_price(price_text)?;

        let asset_name = match name {
            Some(n) => n,
            None => match self.market.detail(asset_id).await {
                Ok(obs) => obs.value.name,
                Err(e) => {
                    warn!(error = %e, asset_id, "detail unavailable; using id as alert name");
                    asset_id.to_string()
                }
            },
        };

        self.alerts
            .save(asset_id, &asset_name, target_price, direction)
            .await
    }

    pub async fn get_alert(&self, asset_id: &str) -> Result<Option<Alert>, AlertError> {
        self.alerts.get(asset_id).await
    }

    pub async fn list_alerts(&self) -> Result<Vec<Alert>, AlertError> {
        self.alerts.list_all().await
    }

    pub async fn delete_alert(&self, alert_id: AlertId) -> Result<bool, AlertError> {
        self.alerts.delete(alert_id).await
    }

    pub async fn triggered(&self) -> Result<Vec<TriggeredAlert>, AlertError> {
        self.log.list_all().await
    }

    pub async fn has_unread(&self) -> Result<bool, AlertError> {
        self.log.has_unread().await
    }

    pub async fn unread_count(&self) -> Result<usize, AlertError> {
        self.log.unread_count().await
    }

    pub async fn clear_triggered(&self) -> Result<(), AlertError> {
        self.log.clear().await
    }

    /// One watch pass: refresh the top list, then the detail of every alerted
    /// asset a live list did not cover.
    pub async fn poll_once(&self) -> anyhow::Result<Vec<TriggeredAlert>> {
        let mut fired = Vec::new();
        let mut covered = HashSet::new();

        match self.top().instrument(child_span("poll_top_list")).await {
            // A cached list was not evaluated, so its assets still need a detail read.
            Ok(r) if r.observation.is_live() => {
                covered.extend(r.observation.value.iter().map(|c| c.id.clone()));
                fired.extend(r.fired);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "top list unavailable"),
        }

        for alert in self.alerts.list_all().await? {
            if covered.contains(&alert.asset_id) {
                continue;
            }

            let span = child_span("poll_detail");
            span.record("asset_id", alert.asset_id.as_str());
            match self.detail(&alert.asset_id).instrument(span).await {
                Ok(r) => fired.extend(r.fired),
                Err(e) => warn!(error = %e, asset_id = %alert.asset_id, "detail unavailable"),
            }
        }

        Ok(fired)
    }
}

/// Evaluation failures never fail the market read that triggered them.
fn fired_or_warn(res: Result<Vec<TriggeredAlert>, AlertError>) -> Vec<TriggeredAlert> {
    res.unwrap_or_else(|e| {
        warn!(error = %e, "alert evaluation failed");
        Vec::new()
    })
}
