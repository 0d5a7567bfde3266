//! Market data client abstraction.

use crate::MarketResult;
use async_trait::async_trait;
use buybot_core::ContractData;

/// Source of market cap and recent buys for an address.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetch market cap and buy transactions for an address.
    /// Every call is a fresh remote fetch.
    async fn fetch_contract_data(&self, address: &str) -> MarketResult<ContractData>;
}
