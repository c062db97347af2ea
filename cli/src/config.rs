use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use market::CacheTtls;
use market::coingecko::client::DEFAULT_BASE_URL;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// sqlx connection string for the alert database.
    pub database_url: String,

    // =========================
    // Upstream
    // =========================
    /// CoinGecko API root, without a trailing slash.
    pub coingecko_url: String,

    /// Quote currency for every price (`usd`, `eur`, ...).
    pub vs_currency: String,

    /// Number of assets requested for the top list.
    pub top_list_limit: usize,

    /// Per-request HTTP timeout.
    pub http_timeout: Duration,

    // =========================
    // Cache
    // =========================
    /// Freshness budget per resource class. List data changes slowly, detail
    /// and chart views are expected to be near live.
    pub ttls: CacheTtls,

    // =========================
    // Session
    // =========================
    /// Default poll cadence for `watch`.
    pub watch_interval: Duration,

    /// JSON log lines instead of pretty output.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Unset variables
    /// take their defaults; set but malformed ones are an error.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = CacheTtls::default();

        let watch_interval = secs_or(&lookup, "WATCH_INTERVAL_SECS", Duration::from_secs(60))?;
        anyhow::ensure!(
            !watch_interval.is_zero(),
            "invalid value for WATCH_INTERVAL_SECS: must be at least 1 second"
        );

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://coinwatch.db?mode=rwc".to_string()),

            coingecko_url: lookup("COINGECKO_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            vs_currency: lookup("VS_CURRENCY")
                .unwrap_or_else(|| "usd".to_string())
                .to_ascii_lowercase(),
            top_list_limit: parse_or(&lookup, "TOP_LIST_LIMIT", 10)?,
            http_timeout: secs_or(&lookup, "HTTP_TIMEOUT_SECS", Duration::from_secs(10))?,

            ttls: CacheTtls {
                top_list: secs_or(&lookup, "TOP_LIST_TTL_SECS", defaults.top_list)?,
                detail: secs_or(&lookup, "DETAIL_TTL_SECS", defaults.detail)?,
                chart: secs_or(&lookup, "CHART_TTL_SECS", defaults.chart)?,
            },

            watch_interval,
            json_logs: lookup("APP_ENV").as_deref() == Some("production"),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {name}: `{raw}`")),
    }
}

fn secs_or<F>(lookup: &F, name: &str, default: Duration) -> anyhow::Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, name, default.as_secs()).map(Duration::from_secs)
}
