//! Market data collection from the blockchain explorer API.
//!
//! This crate provides:
//! - `MarketDataClient` - the fetch abstraction used by the bot
//! - `HttpMarketClient` - the REST implementation
//! - Response parsers for market cap and buy transactions

pub mod client;
pub mod error;
pub mod rest;

pub use client::MarketDataClient;
pub use error::*;
pub use rest::{parse_buys, parse_market_cap, HttpMarketClient, MarketClientConfig};
