use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertError {
    /// Rejected user input. Nothing was written.
    #[error("invalid alert: {0}")]
    Validation(String),

    /// The durable store failed. The stored record is left as it was.
    #[error("persistence failure: {0:#}")]
    Persistence(#[from] anyhow::Error),

    /// A stored record exists but cannot be decoded.
    #[error("stored record `{key}` is corrupt: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
