use std::collections::BTreeMap;
use std::sync::Mutex;

use super::error::{StoreError, StoreResult};
use super::{Message, MessageId, MessageStore};

/// Round trips performed against a [`MemoryStore`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub fetches: usize,
    pub posts: usize,
    pub replaces: usize,
    pub removes: usize,
}

impl StoreStats {
    /// Number of operations that changed the store
    pub fn writes(&self) -> usize {
        self.posts + self.replaces + self.removes
    }
}

struct MemoryState {
    messages: BTreeMap<MessageId, String>,
    next_id: MessageId,
    stats: StoreStats,
}

/// In-process message store
///
/// Ids start at 1 and only grow. Every call is counted so tests can assert
/// on the exact number of round trips an operation needed.
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                messages: BTreeMap::new(),
                next_id: 1,
                stats: StoreStats::default(),
            }),
        }
    }

    /// Operation counters since creation or the last reset
    pub fn stats(&self) -> StoreStats {
        self.state.lock().unwrap().stats
    }

    pub fn reset_stats(&self) {
        self.state.lock().unwrap().stats = StoreStats::default();
    }

    /// Raw text of a message, without counting a fetch
    pub fn text(&self, id: MessageId) -> Option<String> {
        self.state.lock().unwrap().messages.get(&id).cloned()
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.state.lock().unwrap().messages.contains_key(&id)
    }

    /// Number of live messages
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore for MemoryStore {
    async fn fetch(&self, id: MessageId) -> StoreResult<Message> {
        let mut state = self.state.lock().unwrap();
        state.stats.fetches += 1;
        let text = state
            .messages
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))?;
        Ok(Message::new(id, text))
    }

    async fn post(&self, text: String) -> StoreResult<Message> {
        let mut state = self.state.lock().unwrap();
        state.stats.posts += 1;
        let id = state.next_id;
        state.next_id += 1;
        state.messages.insert(id, text.clone());
        Ok(Message::new(id, text))
    }

    async fn replace(&self, id: MessageId, text: String) -> StoreResult<Message> {
        let mut state = self.state.lock().unwrap();
        state.stats.replaces += 1;
        let slot = state
            .messages
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        slot.clone_from(&text);
        Ok(Message::new(id, text))
    }

    async fn remove(&self, id: MessageId) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.stats.removes += 1;
        state
            .messages
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
