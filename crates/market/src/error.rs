//! Error types for market data fetches.

use thiserror::Error;

/// Errors that can occur while fetching market data.
///
/// Every variant means "no data this cycle"; nothing here is retried.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl From<url::ParseError> for MarketError {
    fn from(err: url::ParseError) -> Self {
        MarketError::Config(err.to_string())
    }
}

/// Result type for market operations.
pub type MarketResult<T> = Result<T, MarketError>;
