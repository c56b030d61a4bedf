use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::Entry;
use crate::llm::models::{Message, Role};

/// One persisted message slot. `id` is stable for the life of the message,
/// so repeated saves overwrite the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: Uuid,
    pub position: i64,
    pub role: Role,
    pub content: String,
    pub reasoning: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    pub fn from_entry(position: usize, entry: &Entry) -> Self {
        Self {
            id: entry.id,
            position: position as i64,
            role: entry.message.role,
            content: entry.message.content.clone(),
            reasoning: entry.message.reasoning.clone(),
            timestamp: entry.created_at,
        }
    }

    pub fn into_entry(self) -> Entry {
        Entry {
            id: self.id,
            created_at: self.timestamp,
            message: Message {
                role: self.role,
                content: self.content,
                reasoning: self.reasoning,
            },
        }
    }
}
