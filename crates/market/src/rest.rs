//! Explorer REST API client.
//!
//! Two endpoints are used per address:
//! - `GET {base}/account/{address}` for the market cap
//! - `GET {base}/account/transactions?account={address}&limit={n}` for recent transactions
//!
//! Responses are treated as untyped JSON. Both a bare payload and one wrapped
//! in a `data` field are accepted.

use crate::client::MarketDataClient;
use crate::{MarketError, MarketResult};
use async_trait::async_trait;
use buybot_core::{BuyTransaction, ContractData};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Configuration for the explorer client.
#[derive(Debug, Clone)]
pub struct MarketClientConfig {
    /// API base URL.
    pub base_url: String,
    /// Optional API key, sent as a `token` header.
    pub api_key: Option<String>,
    /// Number of recent transactions requested per address.
    pub transaction_limit: usize,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for MarketClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://public-api.solscan.io".to_string(),
            api_key: None,
            transaction_limit: 10,
            timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP implementation of [`MarketDataClient`].
pub struct HttpMarketClient {
    client: reqwest::Client,
    base_url: Url,
    transaction_limit: usize,
}

impl HttpMarketClient {
    pub fn new(config: MarketClientConfig) -> MarketResult<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(MarketError::Config(format!(
                "{} cannot be used as a base URL",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|e| MarketError::Config(format!("API key: {}", e)))?;
            headers.insert("token", value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            transaction_limit: config.transaction_limit.max(1),
        })
    }

    /// URL of the account summary endpoint.
    pub fn account_url(&self, address: &str) -> MarketResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MarketError::Config("base URL has no path".to_string()))?
            .pop_if_empty()
            .extend(["account", address]);
        Ok(url)
    }

    /// URL of the transaction history endpoint.
    pub fn transactions_url(&self, address: &str) -> MarketResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MarketError::Config("base URL has no path".to_string()))?
            .pop_if_empty()
            .extend(["account", "transactions"]);
        url.query_pairs_mut()
            .append_pair("account", address)
            .append_pair("limit", &self.transaction_limit.to_string());
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> MarketResult<Value> {
        debug!(url = %url, "Fetching");
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(MarketError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }

    async fn fetch_market_cap(&self, address: &str) -> MarketResult<f64> {
        let json = self.get_json(self.account_url(address)?).await?;
        parse_market_cap(&json)
    }

    async fn fetch_buys(&self, address: &str) -> MarketResult<Vec<BuyTransaction>> {
        let json = self.get_json(self.transactions_url(address)?).await?;
        parse_buys(&json)
    }
}

#[async_trait]
impl MarketDataClient for HttpMarketClient {
    async fn fetch_contract_data(&self, address: &str) -> MarketResult<ContractData> {
        let address = address.trim();
        if address.is_empty() || address.chars().any(char::is_whitespace) {
            return Err(MarketError::InvalidAddress(address.to_string()));
        }

        let (market_cap, buys) =
            tokio::try_join!(self.fetch_market_cap(address), self.fetch_buys(address))?;

        debug!(
            address = address,
            market_cap = market_cap,
            buys = buys.len(),
            "Fetched contract data"
        );
        Ok(ContractData { market_cap, buys })
    }
}

/// Read a number that may be encoded as a JSON number or a numeric string.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Unwrap a `{"data": ...}` envelope if present.
fn payload(json: &Value) -> &Value {
    match json.get("data") {
        Some(data) if !data.is_null() => data,
        _ => json,
    }
}

/// Extract the market cap from an account summary response.
pub fn parse_market_cap(json: &Value) -> MarketResult<f64> {
    let body = payload(json);
    body.get("marketCap")
        .or_else(|| json.get("marketCap"))
        .and_then(as_number)
        .ok_or(MarketError::MissingField("marketCap"))
}

/// Instruction type of a transaction entry.
fn instruction_type(tx: &Value) -> Option<&str> {
    tx.pointer("/parsedInstruction/0/type")
        .and_then(Value::as_str)
        .or_else(|| tx.get("type").and_then(Value::as_str))
}

/// Extract buy transactions from a transaction history response.
pub fn parse_buys(json: &Value) -> MarketResult<Vec<BuyTransaction>> {
    let transactions = payload(json).as_array().ok_or_else(|| {
        MarketError::ParseError("transaction list is not an array".to_string())
    })?;

    let buys = transactions
        .iter()
        .filter(|tx| {
            instruction_type(tx)
                .map(|t| t.eq_ignore_ascii_case("buy"))
                .unwrap_or(false)
        })
        .map(|tx| {
            let signature = tx
                .get("txHash")
                .or_else(|| tx.get("signature"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let amount = tx
                .get("amount")
                .and_then(as_number)
                .or_else(|| tx.pointer("/parsedInstruction/0/amount").and_then(as_number))
                .unwrap_or(0.0);
            BuyTransaction::new(signature, amount)
        })
        .collect();

    Ok(buys)
}
