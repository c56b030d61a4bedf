use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::{models::StoredMessage, ConversationStore, StoreError};

/// Process-local store. Used for anonymous sessions and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, Vec<StoredMessage>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of message slots held for `user_id`.
    pub async fn len(&self, user_id: &str) -> usize {
        self.users.read().await.get(user_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn save(&self, user_id: &str, message: &StoredMessage) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let log = users.entry(user_id.to_string()).or_default();
        match log.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => {
                existing.content = message.content.clone();
                existing.reasoning = message.reasoning.clone();
            }
            None => log.push(message.clone()),
        }
        Ok(())
    }

    async fn load(&self, user_id: &str) -> Result<Vec<StoredMessage>, StoreError> {
        let mut messages = self
            .users
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        messages.sort_by(|a, b| (a.timestamp, a.position).cmp(&(b.timestamp, b.position)));
        Ok(messages)
    }
}
