//! Per-chat conversation state for the `/config` flow.

use dashmap::DashMap;
use std::sync::Arc;

/// Where a chat is in the configuration dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    /// The next message in the chat is the contract address to verify.
    AwaitingAddress,
}

/// Conversation states keyed by chat id. Chats not present are idle.
#[derive(Clone, Default)]
pub struct Conversations {
    states: Arc<DashMap<i64, ConversationState>>,
}

impl Conversations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, chat_id: i64) -> ConversationState {
        self.states
            .get(&chat_id)
            .map(|s| *s)
            .unwrap_or_default()
    }

    /// Idle -> AwaitingAddress. Re-issuing `/config` restarts the flow.
    pub fn await_address(&self, chat_id: i64) {
        self.states.insert(chat_id, ConversationState::AwaitingAddress);
    }

    pub fn is_awaiting_address(&self, chat_id: i64) -> bool {
        self.state(chat_id) == ConversationState::AwaitingAddress
    }

    /// Return the chat to idle, yielding the state it was in.
    pub fn finish(&self, chat_id: i64) -> ConversationState {
        self.states
            .remove(&chat_id)
            .map(|(_, state)| state)
            .unwrap_or_default()
    }
}
