//! Telegram bot handlers.

use crate::chat::{ChatError, ChatSink};
use crate::router::{ChatContext, CommandRouter};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberUpdated, InputFile, ParseMode};
use teloxide::utils::command::BotCommands;
use tracing::info;
use url::Url;

/// Bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Register this chat for updates")]
    Start,
    #[command(description = "Set the token contract to track (send the address next)")]
    Config,
    #[command(description = "Show current configuration")]
    Status,
    #[command(description = "Watch an address for buys. Usage: /addwatch <address>")]
    AddWatch(String),
    #[command(description = "Stop watching an address. Usage: /removewatch <address>")]
    RemoveWatch(String),
    #[command(description = "List watched addresses")]
    WatchList,
    #[command(description = "Post a daily update. Usage: /schedule HH:MM")]
    Schedule(String),
    #[command(description = "Remove a daily update. Usage: /unschedule HH:MM")]
    Unschedule(String),
    #[command(description = "Set the alert animation. Usage: /setgif <url> (or 'clear')")]
    SetGif(String),
    #[command(description = "Show the current market cap")]
    MarketCap,
    #[command(description = "Show recent buys")]
    RecentBuys,
    #[command(description = "Post an update now")]
    Update,
    #[command(description = "Show help")]
    Help,
}

/// Where a photo or animation is loaded from.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    Url(Url),
    Path(PathBuf),
}

impl MediaSource {
    /// `http(s)` URLs are fetched by Telegram; anything else is a local file.
    pub fn parse(reference: &str) -> Result<Self, ChatError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ChatError::InvalidMedia("empty media reference".to_string()));
        }
        match Url::parse(reference) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(MediaSource::Url(url)),
            _ => Ok(MediaSource::Path(PathBuf::from(reference))),
        }
    }

    fn into_input_file(self) -> InputFile {
        match self {
            MediaSource::Url(url) => InputFile::url(url),
            MediaSource::Path(path) => InputFile::file(path),
        }
    }
}

/// Telegram bot wrapper.
pub struct TelegramBot {
    bot: Bot,
}

impl TelegramBot {
    /// Create a new bot with the given token.
    pub fn new(token: &str) -> Self {
        let bot = Bot::new(token);
        Self { bot }
    }

    /// Run the update dispatcher until it stops.
    pub async fn run(self: Arc<Self>, router: Arc<CommandRouter>) {
        let bot = self.bot.clone();

        let member_router = Arc::clone(&router);
        let awaiting_router = Arc::clone(&router);
        let address_router = Arc::clone(&router);
        let command_router = Arc::clone(&router);

        let handler = dptree::entry()
            .branch(Update::filter_my_chat_member().endpoint(
                move |upd: ChatMemberUpdated| {
                    let router = Arc::clone(&member_router);
                    async move {
                        let joined = !upd.old_chat_member.kind.is_present()
                            && upd.new_chat_member.kind.is_present();
                        if joined && !upd.chat.is_private() {
                            router.handle_added_to_group(upd.chat.id.0).await;
                        }
                        respond(())
                    }
                },
            ))
            .branch(
                Update::filter_message()
                    .branch(
                        dptree::filter(move |msg: Message| {
                            awaiting_router.is_awaiting_address(msg.chat.id.0)
                        })
                        .endpoint(move |msg: Message| {
                            let router = Arc::clone(&address_router);
                            async move {
                                router
                                    .handle_address_reply(msg.chat.id.0, msg.text())
                                    .await;
                                respond(())
                            }
                        }),
                    )
                    .branch(dptree::entry().filter_command::<Command>().endpoint(
                        move |msg: Message, cmd: Command| {
                            let router = Arc::clone(&command_router);
                            async move {
                                let ctx = ChatContext {
                                    chat_id: msg.chat.id.0,
                                    is_private: msg.chat.is_private(),
                                };
                                router.handle_command(ctx, cmd).await;
                                respond(())
                            }
                        },
                    )),
            );

        info!("Telegram dispatcher starting");
        Dispatcher::builder(bot, handler)
            .default_handler(|_| async {})
            .build()
            .dispatch()
            .await;
    }
}

#[async_trait]
impl ChatSink for TelegramBot {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), ChatError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, photo: &str, caption: &str) -> Result<(), ChatError> {
        let photo = MediaSource::parse(photo)?.into_input_file();
        self.bot
            .send_photo(ChatId(chat_id), photo)
            .caption(caption)
            .await?;
        Ok(())
    }

    async fn send_animation(&self, chat_id: i64, animation: &str) -> Result<(), ChatError> {
        let animation = MediaSource::parse(animation)?.into_input_file();
        self.bot.send_animation(ChatId(chat_id), animation).await?;
        Ok(())
    }
}
