use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::cache::{MarketDataCache, Observation};
use common::clock::Clock;
use crate::errors::MarketError;
use crate::provider::MarketDataProvider;
use crate::types::{CacheKey, ChartDataPoint, Cryptocurrency, CryptocurrencyDetail};

/// Freshness budget per resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub top_list: Duration,
    pub detail: Duration,
    pub chart: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            top_list: Duration::from_secs(30 * 60),
            detail: Duration::from_secs(30),
            chart: Duration::from_secs(30),
        }
    }
}

/// Entry point for every market-data read. Each endpoint goes through its
/// own cache so list, detail and chart views never contend on one entry.
pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    ttls: CacheTtls,
    top_limit: usize,
    top_list: MarketDataCache<Vec<Cryptocurrency>>,
    details: MarketDataCache<CryptocurrencyDetail>,
    charts: MarketDataCache<Vec<ChartDataPoint>>,
}

impl MarketDataService {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        clock: Arc<dyn Clock>,
        ttls: CacheTtls,
        top_limit: usize,
    ) -> Self {
        Self {
            provider,
            ttls,
            top_limit,
            top_list: MarketDataCache::new(Arc::clone(&clock)),
            details: MarketDataCache::new(Arc::clone(&clock)),
            charts: MarketDataCache::new(clock),
        }
    }

    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }

    #[instrument(skip(self), target = "market")]
    pub async fn top_cryptocurrencies(
        &self,
    ) -> Result<Observation<Vec<Cryptocurrency>>, MarketError> {
        let provider = Arc::clone(&self.provider);
        let limit = self.top_limit;

        self.top_list
            .fetch_observed(
                &CacheKey::TopList.to_string(),
                self.ttls.top_list,
                move || async move { provider.top_markets(limit).await },
            )
            .await
    }

    #[instrument(skip(self), target = "market")]
    pub async fn detail(
        &self,
        asset_id: &str,
    ) -> Result<Observation<CryptocurrencyDetail>, MarketError> {
        let provider = Arc::clone(&self.provider);
        let id = asset_id.to_string();

        self.details
            .fetch_observed(
                &CacheKey::Detail(asset_id.to_string()).to_string(),
                self.ttls.detail,
                move || async move { provider.coin_detail(&id).await },
            )
            .await
    }

    #[instrument(skip(self), target = "market")]
    pub async fn chart(
        &self,
        asset_id: &str,
        days: u32,
    ) -> Result<Observation<Vec<ChartDataPoint>>, MarketError> {
        let provider = Arc::clone(&self.provider);
        let id = asset_id.to_string();
        let key = CacheKey::Chart {
            asset_id: asset_id.to_string(),
            days,
        };

        self.charts
            .fetch_observed(&key.to_string(), self.ttls.chart, move || async move {
                provider.market_chart(&id, days).await
            })
            .await
    }
}
