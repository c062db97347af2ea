use std::collections::BTreeSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use common::clock::Clock;

use crate::error::AlertError;
use crate::model::{Alert, AlertId, TriggeredAlert, timestamp};
use crate::store::{KeyValueStore, read_json, write_json};

pub const TRIGGERED_KEY: &str = "triggered_alerts";

/// Stored shape of the log. `fired` outlives `clear()`: it records every
/// alert identity that has ever fired, independent of what is visible.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogRecord {
    entries: Vec<TriggeredAlert>,
    unread: bool,
    #[serde(default)]
    fired: BTreeSet<AlertId>,
}

/// Append-only log of fired alerts plus the "unread" badge flag.
///
/// The log does not deduplicate entries; the evaluator decides what gets
/// appended.
pub struct TriggeredAlertLog {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl TriggeredAlertLog {
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            kv,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    #[instrument(skip(self, alert), target = "alerts", fields(alert_id = %alert.id, asset_id = %alert.asset_id))]
    pub async fn append(
        &self,
        alert: &Alert,
        triggered_price: Decimal,
    ) -> Result<TriggeredAlert, AlertError> {
        let triggered = TriggeredAlert {
            alert: alert.clone(),
            triggered_at: timestamp(self.clock.as_ref()),
            triggered_price,
        };

        let _guard = self.write_lock.lock().await;
        let mut record: LogRecord = read_json(self.kv.as_ref(), TRIGGERED_KEY).await?;
        record.entries.push(triggered.clone());
        record.fired.insert(alert.id);
        record.unread = true;
        write_json(self.kv.as_ref(), TRIGGERED_KEY, &record).await?;

        info!(entries = record.entries.len(), "triggered alert recorded");
        Ok(triggered)
    }

    /// Visible entries, oldest first.
    pub async fn list_all(&self) -> Result<Vec<TriggeredAlert>, AlertError> {
        let record: LogRecord = read_json(self.kv.as_ref(), TRIGGERED_KEY).await?;
        Ok(record.entries)
    }

    /// Empties the visible log and resets the unread flag. Fired identities
    /// are kept, so cleared alerts do not fire again.
    #[instrument(skip(self), target = "alerts")]
    pub async fn clear(&self) -> Result<(), AlertError> {
        let _guard = self.write_lock.lock().await;
        let mut record: LogRecord = read_json(self.kv.as_ref(), TRIGGERED_KEY).await?;
        let cleared = record.entries.len();
        record.entries.clear();
        record.unread = false;
        write_json(self.kv.as_ref(), TRIGGERED_KEY, &record).await?;

        info!(cleared, "triggered alerts cleared");
        Ok(())
    }

    pub async fn has_unread(&self) -> Result<bool, AlertError> {
        let record: LogRecord = read_json(self.kv.as_ref(), TRIGGERED_KEY).await?;
        Ok(record.unread)
    }

    /// Badge count: number of entries while unread, otherwise 0.
    pub async fn unread_count(&self) -> Result<usize, AlertError> {
        let record: LogRecord = read_json(self.kv.as_ref(), TRIGGERED_KEY).await?;
        Ok(if record.unread { record.entries.len() } else { 0 })
    }

    /// Whether the alert identity has ever fired, cleared or not.
    pub async fn has_fired(&self, alert_id: AlertId) -> Result<bool, AlertError> {
        let record: LogRecord = read_json(self.kv.as_ref(), TRIGGERED_KEY).await?;
        Ok(record.fired.contains(&alert_id)
            || record.entries.iter().any(|t| t.source_id() == alert_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;
    use crate::store::memory::InMemoryKvStore;
    use chrono::Utc;
    use common::clock::{ManualClock, SystemClock};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn mk_alert(asset: &str) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            asset_id: asset.to_string(),
            asset_name: asset.to_uppercase(),
            target_price: dec!(100),
            direction: Direction::Above,
            created_at: Utc::now(),
        }
    }

    fn mk_log() -> (Arc<InMemoryKvStore>, TriggeredAlertLog) {
        let kv = Arc::new(InMemoryKvStore::new());
        let log = TriggeredAlertLog::new(kv.clone(), Arc::new(SystemClock));
        (kv, log)
    }

    #[tokio::test]
    async fn empty_log_has_nothing_unread() {
        let (_kv, log) = mk_log();

        assert!(log.list_all().await.unwrap().is_empty());
        assert!(!log.has_unread().await.unwrap());
        assert_eq!(log.unread_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn append_keeps_order_and_sets_unread() {
        let (_kv, log) = mk_log();
        let a = mk_alert("bitcoin");
        let b = mk_alert("ethereum");

        log.append(&a, dec!(101)).await.unwrap();
        log.append(&b, dec!(102)).await.unwrap();

        let all = log.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].source_id(), a.id);
        assert_eq!(all[1].triggered_price, dec!(102));
        assert!(log.has_unread().await.unwrap());
        assert_eq!(log.unread_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn log_does_not_deduplicate() {
        let (_kv, log) = mk_log();
        let a = mk_alert("bitcoin");

        log.append(&a, dec!(101)).await.unwrap();
        log.append(&a, dec!(102)).await.unwrap();

        assert_eq!(log.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn clear_hides_entries_but_remembers_fired_ids() {
        let (_kv, log) = mk_log();
        let a = mk_alert("bitcoin");
        log.append(&a, dec!(101)).await.unwrap();

        log.clear().await.unwrap();

        assert!(log.list_all().await.unwrap().is_empty());
        assert!(!log.has_unread().await.unwrap());
        assert!(log.has_fired(a.id).await.unwrap());
        assert!(!log.has_fired(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn state_survives_a_new_log_over_the_same_store() {
        let (kv, log) = mk_log();
        let a = mk_alert("bitcoin");
        log.append(&a, dec!(101)).await.unwrap();

        let reopened = TriggeredAlertLog::new(kv, Arc::new(SystemClock));

        assert!(reopened.has_unread().await.unwrap());
        assert_eq!(reopened.list_all().await.unwrap()[0].alert, a);
    }

    #[tokio::test]
    async fn failed_clear_keeps_entries() {
        let (kv, log) = mk_log();
        log.append(&mk_alert("bitcoin"), dec!(101)).await.unwrap();

        kv.set_fail_writes(true);
        assert!(matches!(
            log.clear().await,
            Err(AlertError::Persistence(_))
        ));

        assert_eq!(log.list_all().await.unwrap().len(), 1);
        assert!(log.has_unread().await.unwrap());
    }
    #[tokio::test]
    async fn triggered_at_comes_from_the_injected_clock() {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let log = TriggeredAlertLog::new(Arc::new(InMemoryKvStore::new()), clock.clone());
        let a = mk_alert("bitcoin");

        clock.advance_ms(500);
        let t = log.append(&a, dec!(101)).await.unwrap();

        assert_eq!(t.triggered_at.timestamp_millis(), 1_700_000_000_500);
        assert_eq!(log.list_all().await.unwrap()[0].triggered_at, t.triggered_at);
    }
}
