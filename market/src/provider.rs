use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::types::{ChartDataPoint, Cryptocurrency, CryptocurrencyDetail};

/// The three read-only upstream endpoints the app consumes.
#[async_trait]
pub trait MarketDataProvider: Send + Sync + 'static {
    /// Top `limit` assets by market cap.
    async fn top_markets(&self, limit: usize) -> Result<Vec<Cryptocurrency>, ProviderError>;

    async fn coin_detail(&self, asset_id: &str) -> Result<CryptocurrencyDetail, ProviderError>;

    /// Price history over the last `days` days, oldest point first.
    async fn market_chart(
        &self,
        asset_id: &str,
        days: u32,
    ) -> Result<Vec<ChartDataPoint>, ProviderError>;
}
