use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use common::clock::Clock;
use crate::errors::{MarketError, ProviderError};

type LoadResult<V> = Result<V, Arc<ProviderError>>;
type InFlight<V> = Shared<BoxFuture<'static, LoadResult<V>>>;

/// A value and the time it was loaded. Never mutated, only replaced.
#[derive(Debug, Clone)]
pub struct CachedEntry<V> {
    pub value: V,
    pub fetched_at_ms: u64,
}

/// Where a returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Produced by a loader call made (or joined) by this fetch.
    Live,
    /// Served from an entry younger than the ttl.
    Cached,
    /// The loader failed; an expired entry was served instead.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Observation<V> {
    pub value: V,
    pub freshness: Freshness,
}

impl<V> Observation<V> {
    pub fn is_live(&self) -> bool {
        self.freshness == Freshness::Live
    }
}

/// Per-key TTL cache with stale-on-error fallback and in-flight coalescing.
///
/// Guarantees:
/// - A key whose entry is younger than the caller's ttl is served without
///   touching the loader.
/// - Concurrent misses on the same key share one loader invocation. The
///   load is committed by whichever waiter observes it first, so a caller
///   dropping out early does not strand the key.
/// - On loader failure the last committed entry is served, however old.
///   Without one the failure surfaces as `MarketError::NoDataAvailable`.
///
/// Entries are never evicted. Growth is bounded by the number of distinct
/// keys requested during the process lifetime.
pub struct MarketDataCache<V> {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Arc<CachedEntry<V>>>>,
    in_flight: Mutex<HashMap<String, InFlight<V>>>,
}

impl<V> MarketDataCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, loading it when missing or older
    /// than `ttl`.
    pub async fn fetch<F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> Result<V, MarketError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ProviderError>> + Send + 'static,
    {
        self.fetch_observed(key, ttl, loader)
            .await
            .map(|obs| obs.value)
    }

    /// Same as [`fetch`](Self::fetch) but reports whether the value is live,
    /// cached or a stale fallback.
    #[instrument(skip(self, loader), target = "cache", fields(ttl_ms = ttl.as_millis() as u64))]
    pub async fn fetch_observed<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> Result<Observation<V>, MarketError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ProviderError>> + Send + 'static,
    {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        let load = {
            let mut in_flight = self.in_flight.lock();

            if let Some(entry) = self.fresh_entry(key, ttl_ms) {
                debug!(age_ms = self.clock.now_ms().saturating_sub(entry.fetched_at_ms), "cache hit");
                return Ok(Observation {
                    value: entry.value.clone(),
                    freshness: Freshness::Cached,
                });
            }

            match in_flight.get(key) {
                Some(load) => {
                    debug!("joining in-flight load");
                    load.clone()
                }
                None => {
                    debug!("cache miss; loading from upstream");
                    let load = loader().map(|r| r.map_err(Arc::new)).boxed().shared();
                    in_flight.insert(key.to_string(), load.clone());
                    load
                }
            }
        };

        let outcome = load.clone().await;
        self.settle(key, &load, &outcome);

        match outcome {
            Ok(value) => Ok(Observation {
                value,
                freshness: Freshness::Live,
            }),
            Err(source) => {
                let prior = self.entries.lock().get(key).cloned();
                match prior {
                    Some(entry) => {
                        warn!(
                            error = %source,
                            fetched_at_ms = entry.fetched_at_ms,
                            "upstream failed; serving stale entry"
                        );
                        Ok(Observation {
                            value: entry.value.clone(),
                            freshness: Freshness::Stale,
                        })
                    }
                    None => {
                        warn!(error = %source, "upstream failed with nothing cached");
                        Err(MarketError::NoDataAvailable {
                            key: key.to_string(),
                            source,
                        })
                    }
                }
            }
        }
    }

    /// Current entry for `key` regardless of age.
    pub fn peek(&self, key: &str) -> Option<CachedEntry<V>> {
        self.entries.lock().get(key).map(|e| e.as_ref().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fresh_entry(&self, key: &str, ttl_ms: u64) -> Option<Arc<CachedEntry<V>>> {
        let now = self.clock.now_ms();
        self.entries
            .lock()
            .get(key)
            .filter(|e| now.saturating_sub(e.fetched_at_ms) < ttl_ms)
            .cloned()
    }

    /// Retires `load` from the in-flight table and commits a successful
    /// value. No-op if another waiter already settled it.
    fn settle(&self, key: &str, load: &InFlight<V>, outcome: &LoadResult<V>) {
        let mut in_flight = self.in_flight.lock();
        let ours = in_flight
            .get(key)
            .is_some_and(|current| current.ptr_eq(load));
        if !ours {
            return;
        }
        in_flight.remove(key);

        if let Ok(value) = outcome {
            let now = self.clock.now_ms();
            let mut entries = self.entries.lock();
            // fetched_at never moves backwards for a key
            let fetched_at_ms = entries
                .get(key)
                .map_or(now, |prev| prev.fetched_at_ms.max(now));
            entries.insert(
                key.to_string(),
                Arc::new(CachedEntry {
                    value: value.clone(),
                    fetched_at_ms,
                }),
            );
            debug!(fetched_at_ms, "cache entry replaced");
        }
    }
}
