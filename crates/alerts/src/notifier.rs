//! Update cycle: fetch market data and post it to the configured chat.

use crate::chat::ChatSink;
use crate::store::ConfigStore;
use buybot_core::{format_update_message, format_watch_notice};
use buybot_market::MarketDataClient;
use futures_util::future::join_all;
use std::sync::Arc;
use teloxide::utils::html;
use tracing::{debug, error, info, warn};

/// What a single update cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No contract or no chat configured; nothing was fetched.
    Skipped,
    /// The primary contract fetch failed; nothing was sent.
    PrimaryFailed,
    /// The summary was sent.
    Sent {
        watch_notices: usize,
        watch_failures: usize,
    },
}

/// Runs update cycles against the stored configuration.
pub struct Notifier {
    store: ConfigStore,
    market: Arc<dyn MarketDataClient>,
    chat: Arc<dyn ChatSink>,
}

impl Notifier {
    pub fn new(
        store: ConfigStore,
        market: Arc<dyn MarketDataClient>,
        chat: Arc<dyn ChatSink>,
    ) -> Self {
        Self { store, market, chat }
    }

    /// Run one update cycle.
    ///
    /// Watch-list addresses are reported whenever their recent transactions
    /// contain a buy; already reported buys are not tracked.
    pub async fn run_update(&self) -> UpdateOutcome {
        let config = self.store.snapshot().await;
        let Some((contract, chat_id)) = config.update_target() else {
            debug!("Skipping update: contract or chat not configured");
            return UpdateOutcome::Skipped;
        };

        let data = match self.market.fetch_contract_data(contract).await {
            Ok(data) => data,
            Err(e) => {
                warn!(contract = contract, error = %e, "Failed to fetch contract data");
                return UpdateOutcome::PrimaryFailed;
            }
        };

        let message = html::escape(&format_update_message(&data));
        if let Err(e) = self.chat.send_text(chat_id, &message).await {
            error!(chat_id = chat_id, error = %e, "Failed to send update");
        }

        if let Some(gif) = config.alert_gif() {
            if let Err(e) = self.chat.send_animation(chat_id, gif).await {
                error!(chat_id = chat_id, error = %e, "Failed to send alert animation");
            }
        }

        let fetches = config
            .watch_list
            .iter()
            .map(|address| self.market.fetch_contract_data(address));
        let results = join_all(fetches).await;

        let mut watch_notices = 0;
        let mut watch_failures = 0;
        for (address, result) in config.watch_list.iter().zip(results) {
            match result {
                Ok(data) if data.has_buys() => {
                    let notice = html::escape(&format_watch_notice(address, &data));
                    match self.chat.send_text(chat_id, &notice).await {
                        Ok(()) => watch_notices += 1,
                        Err(e) => error!(
                            chat_id = chat_id,
                            address = address.as_str(),
                            error = %e,
                            "Failed to send watch notice"
                        ),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    watch_failures += 1;
                    warn!(
                        address = address.as_str(),
                        error = %e,
                        "Failed to fetch watched address"
                    );
                }
            }
        }

        self.store.mark_updated(chrono::Utc::now()).await;

        info!(
            chat_id = chat_id,
            market_cap = data.market_cap,
            buys = data.buys.len(),
            watch_notices = watch_notices,
            watch_failures = watch_failures,
            "Update sent"
        );

        UpdateOutcome::Sent {
            watch_notices,
            watch_failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockMarketClient, RecordingChat, Sent};
    use pretty_assertions::assert_eq;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: ConfigStore,
        market: Arc<MockMarketClient>,
        chat: Arc<RecordingChat>,
        notifier: Notifier,
    }

    async fn fixture(market: MockMarketClient) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(dir.path().join("bot_config.json")).await;
        let market = Arc::new(market);
        let chat = Arc::new(RecordingChat::new());
        let notifier = Notifier::new(store.clone(), market.clone(), chat.clone());
        Fixture {
            _dir: dir,
            store,
            market,
            chat,
            notifier,
        }
    }

    #[tokio::test]
    async fn test_unset_contract_is_noop() {
        let f = fixture(MockMarketClient::new().with("Mint", 1.0, &[1.0])).await;
        f.store.set_chat_id(-1).await;

        assert_eq!(f.notifier.run_update().await, UpdateOutcome::Skipped);
        assert_eq!(f.market.calls(), 0);
        assert!(f.chat.sent().is_empty());
        assert!(f.store.snapshot().await.last_update.is_none());
    }

    #[tokio::test]
    async fn test_unset_chat_is_noop() {
        let f = fixture(MockMarketClient::new().with("Mint", 1.0, &[])).await;
        f.store.update(|c| c.contract_address = "Mint".to_string()).await;

        assert_eq!(f.notifier.run_update().await, UpdateOutcome::Skipped);
        assert_eq!(f.market.calls(), 0);
    }

    #[tokio::test]
    async fn test_sends_summary_then_animation() {
        let f = fixture(MockMarketClient::new().with("Mint", 12345.0, &[2.0, 5.0])).await;
        f.store.set_contract("Mint", -100).await;
        f.store.set_alert_gif("https://example.com/buy.gif").await;

        let outcome = f.notifier.run_update().await;
        assert_eq!(
            outcome,
            UpdateOutcome::Sent {
                watch_notices: 0,
                watch_failures: 0
            }
        );

        let sent = f.chat.sent();
        assert_eq!(sent.len(), 2);
        let text = sent[0].text().unwrap();
        assert!(text.contains("Market Cap: 12345"));
        assert!(text.contains("Buy 1: 2 SOL"));
        assert!(text.contains("Buy 2: 5 SOL"));
        assert_eq!(
            sent[1],
            Sent::Animation {
                chat_id: -100,
                animation: "https://example.com/buy.gif".to_string()
            }
        );
        assert!(f.store.snapshot().await.last_update.is_some());
    }

    #[tokio::test]
    async fn test_primary_failure_sends_nothing() {
        let f = fixture(MockMarketClient::new()).await;
        f.store.set_contract("Unknown", -100).await;
        f.store.add_watch("WalletA").await;

        assert_eq!(f.notifier.run_update().await, UpdateOutcome::PrimaryFailed);
        assert!(f.chat.sent().is_empty());
        assert_eq!(f.market.calls(), 1);
        assert!(f.store.snapshot().await.last_update.is_none());
    }

    #[tokio::test]
    async fn test_watch_failure_does_not_abort_others() {
        let market = MockMarketClient::new()
            .with("Mint", 500.0, &[])
            .with("WalletOk", 1.0, &[3.0])
            .with("WalletQuiet", 1.0, &[]);
        let f = fixture(market).await;
        f.store.set_contract("Mint", -100).await;
        f.store.add_watch("WalletBroken").await;
        f.store.add_watch("WalletOk").await;
        f.store.add_watch("WalletQuiet").await;

        let outcome = f.notifier.run_update().await;
        assert_eq!(
            outcome,
            UpdateOutcome::Sent {
                watch_notices: 1,
                watch_failures: 1
            }
        );

        let texts = f.chat.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("No recent buys."));
        assert!(texts[1].contains("WalletOk"));
        assert!(!texts.iter().any(|t| t.contains("WalletBroken") || t.contains("WalletQuiet")));
        // Still marked as updated despite the failed watch fetch.
        assert!(f.store.snapshot().await.last_update.is_some());
    }

    #[tokio::test]
    async fn test_repeated_cycles_realert_watch_buys() {
        let market = MockMarketClient::new()
            .with("Mint", 1.0, &[])
            .with("WalletOk", 1.0, &[3.0]);
        let f = fixture(market).await;
        f.store.set_contract("Mint", -100).await;
        f.store.add_watch("WalletOk").await;

        f.notifier.run_update().await;
        f.notifier.run_update().await;

        let notices = f.chat.texts().iter().filter(|t| t.contains("WalletOk")).count();
        assert_eq!(notices, 2);
    }
}
