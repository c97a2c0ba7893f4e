//! Keyed in-memory conversation history.

use std::sync::Arc;

use dashmap::DashMap;

use crate::chat::ChatMessage;

/// Append-only conversation store. Nothing is ever evicted; only the answer
/// pipeline's send window caps what reaches the model, so histories grow for
/// the life of the process.
///
/// Cloning the handle shares the underlying map. Appends to a single
/// conversation take that key's shard lock, so concurrent appends are not
/// lost, though interleaving of whole turns between requests remains
/// possible.
#[derive(Clone, Default)]
pub struct ConversationStore {
    conversations: Arc<DashMap<String, Vec<ChatMessage>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the conversation if it does not exist yet.
    pub fn ensure(&self, id: &str) {
        self.conversations.entry(id.to_string()).or_default();
    }

    pub fn append(&self, id: &str, message: ChatMessage) {
        self.conversations
            .entry(id.to_string())
            .or_default()
            .push(message);
    }

    /// Snapshot of the conversation, oldest first. Empty for unknown ids.
    pub fn history(&self, id: &str) -> Vec<ChatMessage> {
        self.conversations
            .get(id)
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.conversations.contains_key(id)
    }
}
