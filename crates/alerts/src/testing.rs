//! Mock market client and chat sink for unit tests.

use crate::chat::{ChatError, ChatSink};
use async_trait::async_trait;
use buybot_core::{BuyTransaction, ContractData};
use buybot_market::{MarketDataClient, MarketError, MarketResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Market client answering from a fixed table; unknown addresses fail.
#[derive(Default)]
pub struct MockMarketClient {
    responses: HashMap<String, ContractData>,
    calls: AtomicUsize,
}

impl MockMarketClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, address: &str, market_cap: f64, buys: &[f64]) -> Self {
        let buys = buys
            .iter()
            .enumerate()
            .map(|(i, amount)| BuyTransaction::new(format!("{}-{}", address, i), *amount))
            .collect();
        self.responses
            .insert(address.to_string(), ContractData { market_cap, buys });
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataClient for MockMarketClient {
    async fn fetch_contract_data(&self, address: &str) -> MarketResult<ContractData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(address.trim())
            .cloned()
            .ok_or_else(|| MarketError::InvalidAddress(address.to_string()))
    }
}

/// A message recorded by [`RecordingChat`].
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text { chat_id: i64, text: String },
    Photo { chat_id: i64, photo: String, caption: String },
    Animation { chat_id: i64, animation: String },
}

impl Sent {
    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Chat sink that records everything it is asked to send.
#[derive(Default)]
pub struct RecordingChat {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|s| s.text().map(str::to_string))
            .collect()
    }

    pub fn last_text(&self) -> String {
        self.texts().pop().unwrap_or_default()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl ChatSink for RecordingChat {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), ChatError> {
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, photo: &str, caption: &str) -> Result<(), ChatError> {
        self.sent.lock().unwrap().push(Sent::Photo {
            chat_id,
            photo: photo.to_string(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn send_animation(&self, chat_id: i64, animation: &str) -> Result<(), ChatError> {
        self.sent.lock().unwrap().push(Sent::Animation {
            chat_id,
            animation: animation.to_string(),
        });
        Ok(())
    }
}
