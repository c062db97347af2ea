pub mod cache;
pub mod coingecko;
pub mod errors;
pub mod format;
pub mod provider;
pub mod service;
pub mod types;

pub use cache::{CachedEntry, Freshness, MarketDataCache, Observation};
pub use common::clock::{Clock, ManualClock, SystemClock};
pub use errors::{MarketError, ProviderError};
pub use provider::MarketDataProvider;
pub use service::{CacheTtls, MarketDataService};
