//! Conversation state and the actions that reduce it.
//!
//! Entries are only ever appended. The last entry may stay open while an
//! assistant reply streams in; every other entry is frozen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::models::{Message, Role};

pub const GREETING: &str = "Hello! How can I assist you today?";

/// A message plus its identity for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub message: Message,
}

impl Entry {
    pub fn new(message: Message) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AppendUser(String),
    BeginAssistant,
    AppendDelta(String),
    /// A complete reply from a non-streaming turn.
    AppendAssistant {
        content: String,
        reasoning: Option<String>,
    },
    SealAssistant,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    entries: Vec<Entry>,
    open: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting() -> Self {
        Self::new().reduce(Action::AppendAssistant {
            content: GREETING.to_string(),
            reasoning: None,
        })
    }

    /// Rebuilds a conversation from persisted entries. Nothing is left open.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            open: false,
        }
    }

    pub fn reduce(mut self, action: Action) -> Self {
        match action {
            Action::AppendUser(content) => {
                self.open = false;
                self.entries.push(Entry::new(Message::user(content)));
            }
            Action::BeginAssistant => {
                self.open = true;
                self.entries.push(Entry::new(Message::assistant("")));
            }
            Action::AppendDelta(delta) => {
                if !self.open {
                    self.open = true;
                    self.entries.push(Entry::new(Message::assistant("")));
                }
                if let Some(last) = self.entries.last_mut() {
                    last.message.content.push_str(&delta);
                }
            }
            Action::AppendAssistant { content, reasoning } => {
                self.open = false;
                self.entries.push(Entry::new(Message {
                    role: Role::Assistant,
                    content,
                    reasoning,
                }));
            }
            Action::SealAssistant => self.open = false,
        }
        self
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    /// The assistant entry currently receiving deltas.
    pub fn open_entry(&self) -> Option<&Entry> {
        if self.open {
            self.entries.last()
        } else {
            None
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Full history in the shape the relay expects.
    pub fn messages(&self) -> Vec<Message> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
