//! Telegram side of the buy alert bot.
//!
//! This crate provides:
//! - JSON file storage for the bot configuration
//! - Command routing and the per-chat `/config` dialogue
//! - The update cycle and its scheduler
//! - Telegram bot integration

pub mod chat;
pub mod conversation;
pub mod notifier;
pub mod router;
pub mod scheduler;
pub mod store;
pub mod telegram;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{ChatError, ChatSink};
pub use conversation::{ConversationState, Conversations};
pub use notifier::{Notifier, UpdateOutcome};
pub use router::{ChatContext, CommandRouter};
pub use scheduler::{start_scheduler, ScheduleTable, SchedulerCommand, SchedulerHandle};
pub use store::ConfigStore;
pub use telegram::{Command, TelegramBot};
