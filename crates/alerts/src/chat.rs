//! Outbound chat abstraction.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
    #[error("Invalid media reference: {0}")]
    InvalidMedia(String),
}

/// Capability surface the bot needs from the chat platform.
///
/// Text is sent with HTML formatting enabled.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), ChatError>;

    /// Send a static image (URL or local path) with a caption.
    async fn send_photo(&self, chat_id: i64, photo: &str, caption: &str) -> Result<(), ChatError>;

    /// Send an animation (URL or local path).
    async fn send_animation(&self, chat_id: i64, animation: &str) -> Result<(), ChatError>;
}
