//! Wire shapes for the CoinGecko v3 API.
//!
//! Decoding is strict: anything the domain types need and the response lacks
//! becomes a `ProviderError` instead of a defaulted value.

use std::collections::HashMap;

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::ProviderError;
use crate::types::{ChartDataPoint, Cryptocurrency, CryptocurrencyDetail};

/// One element of `/coins/markets`.
#[derive(Debug, Deserialize)]
pub struct MarketRow {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: String,
    pub current_price: Option<Decimal>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub price_change_percentage_24h: Option<f64>,
}

impl TryFrom<MarketRow> for Cryptocurrency {
    type Error = ProviderError;

    fn try_from(row: MarketRow) -> Result<Self, Self::Error> {
        Ok(Self {
            current_price: row
                .current_price
                .ok_or(ProviderError::MissingField("current_price"))?,
            market_cap: row.market_cap.unwrap_or_default(),
            id: row.id,
            symbol: row.symbol,
            name: row.name,
            image: row.image,
            market_cap_rank: row.market_cap_rank,
            price_change_percentage_24h: row.price_change_percentage_24h,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageLinks {
    pub large: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub en: String,
}

/// `market_data` block of `/coins/{id}`. Per-currency values are keyed by
/// the lowercase currency code.
#[derive(Debug, Deserialize)]
pub struct MarketData {
    pub current_price: HashMap<String, Decimal>,
    #[serde(default)]
    pub market_cap: HashMap<String, f64>,
    #[serde(default)]
    pub total_volume: HashMap<String, f64>,
    #[serde(default)]
    pub high_24h: HashMap<String, Decimal>,
    #[serde(default)]
    pub low_24h: HashMap<String, Decimal>,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_7d: Option<f64>,
    pub price_change_percentage_30d: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
}

/// `/coins/{id}` with `market_data=true`.
#[derive(Debug, Deserialize)]
pub struct CoinResponse {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: ImageLinks,
    pub market_cap_rank: Option<u32>,
    pub market_data: Option<MarketData>,
    #[serde(default)]
    pub description: Description,
}

impl CoinResponse {
    pub fn into_detail(self, vs_currency: &str) -> Result<CryptocurrencyDetail, ProviderError> {
        let md = self
            .market_data
            .ok_or(ProviderError::MissingField("market_data"))?;

        let current_price = md
            .current_price
            .get(vs_currency)
            .copied()
            .ok_or(ProviderError::MissingField("market_data.current_price"))?;

        Ok(CryptocurrencyDetail {
            id: self.id,
            symbol: self.symbol,
            name: self.name,
            image: self.image.large,
            current_price,
            market_cap: md.market_cap.get(vs_currency).copied().unwrap_or_default(),
            market_cap_rank: self.market_cap_rank,
            price_change_percentage_24h: md.price_change_percentage_24h,
            price_change_percentage_7d: md.price_change_percentage_7d,
            price_change_percentage_30d: md.price_change_percentage_30d,
            total_volume: md.total_volume.get(vs_currency).copied().unwrap_or_default(),
            high_24h: md.high_24h.get(vs_currency).copied(),
            low_24h: md.low_24h.get(vs_currency).copied(),
            circulating_supply: md.circulating_supply,
            total_supply: md.total_supply,
            description: self.description.en,
        })
    }
}

/// `/coins/{id}/market_chart`. Each price is a `[timestamp_ms, price]` pair.
#[derive(Debug, Deserialize)]
pub struct MarketChartResponse {
    pub prices: Vec<(f64, f64)>,
}

impl TryFrom<MarketChartResponse> for Vec<ChartDataPoint> {
    type Error = ProviderError;

    fn try_from(resp: MarketChartResponse) -> Result<Self, Self::Error> {
        resp.prices
            .into_iter()
            .map(|(ts_ms, value)| {
                let date = DateTime::from_timestamp_millis(ts_ms as i64)
                    .ok_or(ProviderError::MissingField("prices.timestamp"))?;
                Ok(ChartDataPoint { date, value })
            })
            .collect()
    }
}
