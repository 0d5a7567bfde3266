//! Chat command handling.
//!
//! Private chats only ever get the onboarding reply. Group chats can run
//! every command; `/config` starts a two-step exchange where the next message
//! in the same chat is verified as the contract address.

use crate::chat::ChatSink;
use crate::conversation::Conversations;
use crate::notifier::{Notifier, UpdateOutcome};
use crate::scheduler::SchedulerHandle;
use crate::store::ConfigStore;
use crate::telegram::Command;
use buybot_core::{format_buys, format_market_cap, DailyTime, Trigger};
use buybot_market::MarketDataClient;
use std::sync::Arc;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html::escape;
use tracing::{error, info, warn};

pub const ONBOARDING_TEXT: &str = "👋 Hi! I post market cap and buy alerts for a token.\n\n\
     Add me to a group and run /config there to start tracking a contract.";

/// Where an incoming message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatContext {
    pub chat_id: i64,
    pub is_private: bool,
}

impl ChatContext {
    pub fn group(chat_id: i64) -> Self {
        Self {
            chat_id,
            is_private: false,
        }
    }

    pub fn private(chat_id: i64) -> Self {
        Self {
            chat_id,
            is_private: true,
        }
    }
}

/// Routes chat commands to store mutations and market queries.
pub struct CommandRouter {
    store: ConfigStore,
    market: Arc<dyn MarketDataClient>,
    chat: Arc<dyn ChatSink>,
    notifier: Arc<Notifier>,
    scheduler: SchedulerHandle,
    conversations: Conversations,
    onboarding_image: Option<String>,
}

impl CommandRouter {
    pub fn new(
        store: ConfigStore,
        market: Arc<dyn MarketDataClient>,
        chat: Arc<dyn ChatSink>,
        notifier: Arc<Notifier>,
        scheduler: SchedulerHandle,
    ) -> Self {
        Self {
            store,
            market,
            chat,
            notifier,
            scheduler,
            conversations: Conversations::new(),
            onboarding_image: None,
        }
    }

    /// Image sent with the onboarding text in private chats.
    pub fn with_onboarding_image(mut self, image: Option<String>) -> Self {
        self.onboarding_image = image.filter(|i| !i.trim().is_empty());
        self
    }

    /// Whether the next message in this chat answers a `/config` prompt.
    pub fn is_awaiting_address(&self, chat_id: i64) -> bool {
        self.conversations.is_awaiting_address(chat_id)
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.chat.send_text(chat_id, text).await {
            error!(chat_id = chat_id, error = %e, "Failed to send reply");
        }
    }

    async fn send_onboarding(&self, chat_id: i64) {
        let result = match &self.onboarding_image {
            Some(image) => self.chat.send_photo(chat_id, image, ONBOARDING_TEXT).await,
            None => self.chat.send_text(chat_id, ONBOARDING_TEXT).await,
        };
        if let Err(e) = result {
            error!(chat_id = chat_id, error = %e, "Failed to send onboarding");
        }
    }

    /// The bot was added to a group.
    pub async fn handle_added_to_group(&self, chat_id: i64) {
        info!(chat_id = chat_id, "Added to group");
        self.reply(
            chat_id,
            "👋 Thanks for adding me!\n\nRun /config to set the token contract to track, \
             or /help to see all commands.",
        )
        .await;
    }

    /// Handle a message while the chat is awaiting a contract address.
    /// The chat returns to idle whatever the verification result; a message
    /// without text fails verification.
    pub async fn handle_address_reply(&self, chat_id: i64, text: Option<&str>) {
        self.conversations.finish(chat_id);
        let Some(address) = text.map(str::trim) else {
            self.reply_unverified(chat_id).await;
            return;
        };

        self.reply(chat_id, &format!("🔍 Verifying <code>{}</code>...", escape(address)))
            .await;

        match self.market.fetch_contract_data(address).await {
            Ok(data) => {
                self.store.set_contract(address, chat_id).await;
                info!(chat_id = chat_id, contract = address, "Contract configured");
                self.reply(
                    chat_id,
                    &format!(
                        "✅ Now tracking <code>{}</code>\n{}\n\nUpdates will be posted in this chat.",
                        escape(address),
                        format_market_cap(data.market_cap)
                    ),
                )
                .await;
            }
            Err(e) => {
                warn!(chat_id = chat_id, error = %e, "Contract verification failed");
                self.reply_unverified(chat_id).await;
            }
        }
    }

    async fn reply_unverified(&self, chat_id: i64) {
        self.reply(
            chat_id,
            "❌ Could not verify that address. Run /config to try again.",
        )
        .await;
    }

    /// Handle a parsed command.
    pub async fn handle_command(&self, ctx: ChatContext, cmd: Command) {
        if ctx.is_private {
            self.send_onboarding(ctx.chat_id).await;
            return;
        }

        let chat_id = ctx.chat_id;
        match cmd {
            Command::Start => {
                self.store.set_chat_id(chat_id).await;
                self.reply(chat_id, ONBOARDING_TEXT).await;
            }

            Command::Config => {
                self.conversations.await_address(chat_id);
                self.reply(
                    chat_id,
                    "📝 Send the token contract address as your next message.",
                )
                .await;
            }

            Command::Status => {
                let text = self.status_text().await;
                self.reply(chat_id, &text).await;
            }

            Command::AddWatch(address) => {
                let address = address.trim();
                if address.is_empty() {
                    self.reply(chat_id, &escape("Usage: /addwatch <address>")).await;
                } else if self.store.add_watch(address).await {
                    self.reply(
                        chat_id,
                        &format!("👀 Added <code>{}</code> to the watch list", escape(address)),
                    )
                    .await;
                } else {
                    self.reply(
                        chat_id,
                        &format!("<code>{}</code> is already on the watch list", escape(address)),
                    )
                    .await;
                }
            }

            Command::RemoveWatch(address) => {
                let address = address.trim();
                if address.is_empty() {
                    self.reply(chat_id, &escape("Usage: /removewatch <address>")).await;
                } else if self.store.remove_watch(address).await {
                    self.reply(
                        chat_id,
                        &format!("Removed <code>{}</code> from the watch list", escape(address)),
                    )
                    .await;
                } else {
                    self.reply(
                        chat_id,
                        &format!(
                            "<code>{}</code> was not found in the watch list",
                            escape(address)
                        ),
                    )
                    .await;
                }
            }

            Command::WatchList => {
                let config = self.store.snapshot().await;
                if config.watch_list.is_empty() {
                    self.reply(chat_id, "The watch list is empty.").await;
                } else {
                    let list = config
                        .watch_list
                        .iter()
                        .map(|a| escape(a))
                        .collect::<Vec<_>>()
                        .join("\n");
                    self.reply(chat_id, &format!("<b>Watch list</b>\n{}", list)).await;
                }
            }

            Command::Schedule(value) => match value.parse::<DailyTime>() {
                Ok(time) => {
                    self.store.add_schedule(time).await;
                    self.scheduler.add(Trigger::DailyAt(time)).await;
                    self.reply(chat_id, &format!("⏰ Daily update scheduled at {}", time))
                        .await;
                }
                Err(_) => {
                    self.reply(
                        chat_id,
                        "Invalid time format. Usage: /schedule HH:MM (e.g. /schedule 09:30)",
                    )
                    .await;
                }
            },

            Command::Unschedule(value) => match value.parse::<DailyTime>() {
                Ok(time) => {
                    if self.store.remove_schedule(time).await {
                        self.scheduler.remove(Trigger::DailyAt(time)).await;
                        self.reply(chat_id, &format!("Daily update at {} removed", time))
                            .await;
                    } else {
                        self.reply(chat_id, &format!("No daily update at {}", time)).await;
                    }
                }
                Err(_) => {
                    self.reply(chat_id, "Invalid time format. Usage: /unschedule HH:MM")
                        .await;
                }
            },

            Command::SetGif(value) => {
                let value = value.trim();
                if value.is_empty() || value.eq_ignore_ascii_case("clear") {
                    self.store.set_alert_gif("").await;
                    self.reply(chat_id, "Alert animation cleared").await;
                } else {
                    self.store.set_alert_gif(value).await;
                    self.reply(chat_id, "🎬 Alert animation set").await;
                }
            }

            Command::MarketCap => {
                let Some(contract) = self.configured_contract(chat_id).await else {
                    return;
                };
                match self.market.fetch_contract_data(&contract).await {
                    Ok(data) => {
                        self.reply(chat_id, &format!("📊 {}", format_market_cap(data.market_cap)))
                            .await;
                    }
                    Err(e) => {
                        warn!(contract = contract.as_str(), error = %e, "Market cap fetch failed");
                        self.reply(chat_id, "❌ Failed to fetch market cap.").await;
                    }
                }
            }

            Command::RecentBuys => {
                let Some(contract) = self.configured_contract(chat_id).await else {
                    return;
                };
                match self.market.fetch_contract_data(&contract).await {
                    Ok(data) if data.has_buys() => {
                        self.reply(
                            chat_id,
                            &format!("🟢 Recent buys:\n{}", format_buys(&data.buys)),
                        )
                        .await;
                    }
                    Ok(_) => self.reply(chat_id, "No recent buys.").await,
                    Err(e) => {
                        warn!(contract = contract.as_str(), error = %e, "Recent buys fetch failed");
                        self.reply(chat_id, "❌ Failed to fetch recent buys.").await;
                    }
                }
            }

            Command::Update => {
                let outcome = self.notifier.run_update().await;
                info!(chat_id = chat_id, ?outcome, "Manual update");
                match outcome {
                    UpdateOutcome::Skipped => {
                        self.reply(chat_id, "No contract configured yet. Use /config first.")
                            .await;
                    }
                    UpdateOutcome::PrimaryFailed => {
                        self.reply(chat_id, "❌ Failed to fetch contract data.").await;
                    }
                    UpdateOutcome::Sent { .. } => {}
                }
            }

            Command::Help => {
                self.reply(chat_id, &escape(&Command::descriptions().to_string()))
                    .await;
            }
        }
    }

    /// Tracked contract, or a "not configured" reply.
    async fn configured_contract(&self, chat_id: i64) -> Option<String> {
        let config = self.store.snapshot().await;
        match config.contract_address() {
            Some(contract) => Some(contract.to_string()),
            None => {
                self.reply(chat_id, "No contract configured yet. Use /config first.")
                    .await;
                None
            }
        }
    }

    async fn status_text(&self) -> String {
        let config = self.store.snapshot().await;
        format!(
            "<b>Current Configuration</b>\n\n\
             Contract: {}\n\
             Chat: {}\n\
             Alert GIF: {}\n\
             Watch list: {} address(es)\n\
             Daily schedules: {}\n\
             Last update: {}",
            config
                .contract_address()
                .map(|c| format!("<code>{}</code>", escape(c)))
                .unwrap_or_else(|| "Not set".to_string()),
            config
                .chat_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "Not set".to_string()),
            config.alert_gif().map(escape).unwrap_or_else(|| "None".to_string()),
            config.watch_list.len(),
            if config.schedules.is_empty() {
                "None".to_string()
            } else {
                config
                    .schedules
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            },
            config
                .last_update
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "Never".to_string()),
        )
    }
}
