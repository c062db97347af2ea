use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use common::clock::Clock;

use crate::error::AlertError;
use crate::model::{Alert, AlertId, Direction, timestamp, validate_target_price};
use crate::store::{KeyValueStore, read_json, write_json};

pub const ALERTS_KEY: &str = "price_alerts";

/// Stored shape: one alert per asset id, serialized as a single record.
type AlertBook = BTreeMap<String, Alert>;

/// Durable alert definitions, at most one per asset.
///
/// Every mutating call reads, edits and rewrites the whole record while
/// holding `write_lock`, so a racing save and delete cannot leave both a
/// stale and a fresh alert behind.
pub struct AlertStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl AlertStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            kv,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    /// Creates the alert for `asset_id`, replacing any existing one. The new
    /// alert always gets a fresh id.
    #[instrument(skip(self, asset_name), target = "alerts")]
    pub async fn save(
        &self,
        asset_id: &str,
        asset_name: &str,
        target_price: Decimal,
        direction: Direction,
    ) -> Result<Alert, AlertError> {
        validate_target_price(target_price)?;
        if asset_id.trim().is_empty() {
            return Err(AlertError::Validation("asset id must not be empty".into()));
        }

        let alert = Alert {
            id: Uuid::new_v4(),
            asset_id: asset_id.to_string(),
            asset_name: asset_name.to_string(),
            target_price,
            direction,
            created_at: timestamp(self.clock.as_ref()),
        };

        let _guard = self.write_lock.lock().await;
        let mut book: AlertBook = read_json(self.kv.as_ref(), ALERTS_KEY).await?;
        let replaced = book.insert(alert.asset_id.clone(), alert.clone());
        write_json(self.kv.as_ref(), ALERTS_KEY, &book).await?;

        info!(
            alert_id = %alert.id,
            replaced_id = ?replaced.map(|a| a.id),
            "price alert saved"
        );
        Ok(alert)
    }

    pub async fn get(&self, asset_id: &str) -> Result<Option<Alert>, AlertError> {
        let mut book: AlertBook = read_json(self.kv.as_ref(), ALERTS_KEY).await?;
        Ok(book.remove(asset_id))
    }

    /// Removes the alert with `alert_id`. Returns whether one was removed;
    /// an unknown id is not an error.
    #[instrument(skip(self), target = "alerts")]
    pub async fn delete(&self, alert_id: AlertId) -> Result<bool, AlertError> {
        let _guard = self.write_lock.lock().await;
        let mut book: AlertBook = read_json(self.kv.as_ref(), ALERTS_KEY).await?;

        let before = book.len();
        book.retain(|_, a| a.id != alert_id);
        if book.len() == before {
            debug!("no alert with this id; nothing to delete");
            return Ok(false);
        }

        write_json(self.kv.as_ref(), ALERTS_KEY, &book).await?;
        info!("price alert deleted");
        Ok(true)
    }

    /// All live alerts, oldest first.
    pub async fn list_all(&self) -> Result<Vec<Alert>, AlertError> {
        let book: AlertBook = read_json(self.kv.as_ref(), ALERTS_KEY).await?;
        let mut alerts: Vec<Alert> = book.into_values().collect();
        alerts.sort_by_key(|a| a.created_at);
        Ok(alerts)
    }
}
