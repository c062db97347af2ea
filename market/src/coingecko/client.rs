use std::time::Duration;

use async_trait::async_trait;
use common::logger::warn_if_slow;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::coingecko::types::{CoinResponse, MarketChartResponse, MarketRow};
use crate::errors::ProviderError;
use crate::provider::MarketDataProvider;
use crate::types::{ChartDataPoint, Cryptocurrency, CryptocurrencyDetail};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: Url,
    vs_currency: String,
}

impl CoinGeckoClient {
    pub fn new(
        base_url: String,
        vs_currency: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|_| ProviderError::InvalidBaseUrl(base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            http,
            base_url,
            vs_currency: vs_currency.to_lowercase(),
        })
    }

    /// Base url extended by `segments`, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = self.endpoint(segments)?;

        let resp = warn_if_slow(
            "coingecko_request",
            Duration::from_secs(2),
            self.http.get(url).query(query).send(),
        )
        .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    #[instrument(skip(self), level = "debug")]
    async fn top_markets(&self, limit: usize) -> Result<Vec<Cryptocurrency>, ProviderError> {
        let rows: Vec<MarketRow> = self
            .get_json(
                &["coins", "markets"],
                &[
                    ("vs_currency", self.vs_currency.clone()),
                    ("order", "market_cap_desc".to_string()),
                    ("per_page", limit.to_string()),
                    ("page", "1".to_string()),
                    ("sparkline", "false".to_string()),
                ],
            )
            .await?;

        let coins = rows
            .into_iter()
            .map(Cryptocurrency::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = coins.len(), "top markets fetched");
        Ok(coins)
    }

    #[instrument(skip(self), level = "debug")]
    async fn coin_detail(&self, asset_id: &str) -> Result<CryptocurrencyDetail, ProviderError> {
        let resp: CoinResponse = self
            .get_json(
                &["coins", asset_id],
                &[
                    ("localization", "false".to_string()),
                    ("tickers", "false".to_string()),
                    ("market_data", "true".to_string()),
                    ("community_data", "false".to_string()),
                    ("developer_data", "false".to_string()),
                    ("sparkline", "false".to_string()),
                ],
            )
            .await?;

        let detail = resp.into_detail(&self.vs_currency)?;
        debug!(price = %detail.current_price, "coin detail fetched");
        Ok(detail)
    }

    #[instrument(skip(self), level = "debug")]
    async fn market_chart(
        &self,
        asset_id: &str,
        days: u32,
    ) -> Result<Vec<ChartDataPoint>, ProviderError> {
        let resp: MarketChartResponse = self
            .get_json(
                &["coins", asset_id, "market_chart"],
                &[
                    ("vs_currency", self.vs_currency.clone()),
                    ("days", days.to_string()),
                ],
            )
            .await?;

        let points = Vec::<ChartDataPoint>::try_from(resp)?;
        debug!(points = points.len(), "market chart fetched");
        Ok(points)
    }
}
