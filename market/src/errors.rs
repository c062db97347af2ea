use std::sync::Arc;

use thiserror::Error;

/// Failures talking to the upstream market-data provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("provider response missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid provider base url `{0}`")]
    InvalidBaseUrl(String),
}

#[derive(Error, Debug, Clone)]
pub enum MarketError {
    /// The loader failed and nothing was ever cached for this key.
    #[error("no data available for {key}")]
    NoDataAvailable {
        key: String,
        #[source]
        source: Arc<ProviderError>,
    },
}
