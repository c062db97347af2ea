use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use alerts::store::KeyValueStore;

/// In-memory store that counts writes, so tests can assert that a call
/// did or did not touch durable state.
#[derive(Default)]
pub struct RecordingKvStore {
    pub map: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    pub writes: AtomicUsize,
}

impl RecordingKvStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for RecordingKvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.map.lock().await.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.map.lock().await.remove(key);
        Ok(())
    }
}
