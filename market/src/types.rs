use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the top-N market snapshot, ordered by market cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cryptocurrency {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: String,
    pub current_price: Decimal,
    pub market_cap: f64,
    pub market_cap_rank: Option<u32>,
    pub price_change_percentage_24h: Option<f64>,
}

/// Full single-asset view used by the detail screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptocurrencyDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    /// Large logo url.
    pub image: String,
    pub current_price: Decimal,
    pub market_cap: f64,
    pub market_cap_rank: Option<u32>,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_7d: Option<f64>,
    pub price_change_percentage_30d: Option<f64>,
    pub total_volume: f64,
    pub high_24h: Option<Decimal>,
    pub low_24h: Option<Decimal>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    /// English description, possibly empty.
    pub description: String,
}

/// A single point of a historical price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

/// Preset history windows offered by the chart view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartWindow {
    OneDay,
    SevenDays,
    ThirtyDays,
    OneYear,
}

impl ChartWindow {
    pub const ALL: [ChartWindow; 4] = [
        ChartWindow::OneDay,
        ChartWindow::SevenDays,
        ChartWindow::ThirtyDays,
        ChartWindow::OneYear,
    ];

    pub fn days(self) -> u32 {
        match self {
            ChartWindow::OneDay => 1,
            ChartWindow::SevenDays => 7,
            ChartWindow::ThirtyDays => 30,
            ChartWindow::OneYear => 365,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChartWindow::OneDay => "1D",
            ChartWindow::SevenDays => "7D",
            ChartWindow::ThirtyDays => "30D",
            ChartWindow::OneYear => "1Y",
        }
    }
}

/// Cache key for one upstream resource.
///
/// Rendered as `top-list`, `detail:<assetId>` or `chart:<assetId>:<days>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    TopList,
    Detail(String),
    Chart { asset_id: String, days: u32 },
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::TopList => f.write_str("top-list"),
            CacheKey::Detail(id) => write!(f, "detail:{id}"),
            CacheKey::Chart { asset_id, days } => write!(f, "chart:{asset_id}:{days}"),
        }
    }
}
