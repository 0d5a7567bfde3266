//! Market data returned by the explorer API.

use serde::{Deserialize, Serialize};

/// A transaction classified as a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyTransaction {
    /// Transaction signature (may be empty if the provider omits it)
    pub signature: String,
    /// Purchase amount in SOL
    pub amount: f64,
}

impl BuyTransaction {
    pub fn new(signature: impl Into<String>, amount: f64) -> Self {
        Self {
            signature: signature.into(),
            amount,
        }
    }
}

/// Market cap and recent buys for one address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractData {
    pub market_cap: f64,
    pub buys: Vec<BuyTransaction>,
}

impl ContractData {
    pub fn has_buys(&self) -> bool {
        !self.buys.is_empty()
    }
}
