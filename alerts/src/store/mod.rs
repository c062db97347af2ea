pub mod memory;
pub mod sqlite_store;

use std::time::Duration;

use common::logger::warn_if_slow;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AlertError;

/// Durable byte store. Every call is atomic on its own: a reader sees
/// either the previous value or the new one, never a mix.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Loads the JSON record under `key`, or `T::default()` if none exists.
pub(crate) async fn read_json<T>(kv: &dyn KeyValueStore, key: &'static str) -> Result<T, AlertError>
where
    T: DeserializeOwned + Default,
{
    let raw = warn_if_slow("kv_get", Duration::from_millis(50), kv.get(key)).await?;

    match raw {
        None => Ok(T::default()),
        Some(bytes) => {
            serde_json::from_slice(&bytes).map_err(|source| AlertError::Corrupt { key, source })
        }
    }
}

pub(crate) async fn write_json<T>(
    kv: &dyn KeyValueStore,
    key: &'static str,
    value: &T,
) -> Result<(), AlertError>
where
    T: Serialize,
{
    let bytes = serde_json::to_vec(value).map_err(|source| AlertError::Corrupt { key, source })?;
    warn_if_slow("kv_set", Duration::from_millis(50), kv.set(key, &bytes)).await?;
    Ok(())
}
