use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::{ClientError, RelayClient};
use crate::conversation::{Action, Conversation};
use crate::db::{ConversationStore, StoreError, StoredMessage};
use crate::llm::models::ChatCompletion;
use crate::llm::reasoning::extract_reasoning;
use crate::stream::{self, StreamEvent};

/// How often a streaming reply is written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistPolicy {
    /// One write per folded delta.
    EveryDelta,
    /// At most one write per interval. The final state is always written.
    Throttled(Duration),
}

impl PersistPolicy {
    pub fn from_interval_ms(ms: Option<u64>) -> Self {
        match ms {
            Some(ms) if ms > 0 => PersistPolicy::Throttled(Duration::from_millis(ms)),
            _ => PersistPolicy::EveryDelta,
        }
    }
}

/// One user's conversation plus where it gets persisted.
pub struct ChatSession {
    conversation: Conversation,
    store: Option<(Arc<dyn ConversationStore>, String)>,
    policy: PersistPolicy,
    last_write: Option<Instant>,
    dirty: bool,
}

impl ChatSession {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            store: None,
            policy: PersistPolicy::EveryDelta,
            last_write: None,
            dirty: false,
        }
    }

    /// In-memory only; nothing is persisted.
    pub fn anonymous() -> Self {
        Self::new(Conversation::with_greeting())
    }

    /// Loads the user's history, or starts with the greeting if there is none.
    pub async fn restore(
        store: Arc<dyn ConversationStore>,
        user_id: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let user_id = user_id.into();
        let history = store.load(&user_id).await?;
        debug!(user = %user_id, messages = history.len(), "restored conversation");

        let conversation = if history.is_empty() {
            Conversation::with_greeting()
        } else {
            Conversation::from_entries(history.into_iter().map(StoredMessage::into_entry).collect())
        };

        Ok(Self::new(conversation).with_store(store, user_id))
    }

    pub fn with_store(mut self, store: Arc<dyn ConversationStore>, user_id: impl Into<String>) -> Self {
        self.store = Some((store, user_id.into()));
        self
    }

    pub fn with_policy(mut self, policy: PersistPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    fn dispatch(&mut self, action: Action) {
        let current = std::mem::take(&mut self.conversation);
        self.conversation = current.reduce(action);
        self.dirty = true;
    }

    /// Writes the last entry unless throttling says to wait. Store failures
    /// never end the turn.
    async fn persist_last(&mut self, force: bool) {
        let Some((store, user_id)) = &self.store else {
            self.dirty = false;
            return;
        };
        if !self.dirty {
            return;
        }

        if let (PersistPolicy::Throttled(interval), Some(at), false) = (self.policy, self.last_write, force) {
            if at.elapsed() < interval {
                return;
            }
        }

        let position = self.conversation.len().saturating_sub(1);
        let Some(entry) = self.conversation.last() else {
            return;
        };

        let record = StoredMessage::from_entry(position, entry);
        if let Err(e) = store.save(user_id, &record).await {
            warn!(user = %user_id, message_id = %record.id, "failed to persist message: {}", e);
        }
        self.last_write = Some(Instant::now());
        self.dirty = false;
    }

    pub async fn push_user(&mut self, text: impl Into<String>) {
        self.dispatch(Action::AppendUser(text.into()));
        self.persist_last(true).await;
    }

    /// Folds an SSE byte stream into a new assistant message. Whatever was
    /// folded before a transport error stays in the conversation.
    pub async fn fold_stream<S, E>(&mut self, bytes: S, mut on_delta: impl FnMut(&str)) -> Result<(), E>
    where
        S: Stream<Item = Result<Bytes, E>>,
    {
        self.dispatch(Action::BeginAssistant);
        self.last_write = None;

        let events = stream::assemble(bytes);
        let mut events = std::pin::pin!(events);
        let mut outcome = Ok(());

        while let Some(event) = events.next().await {
            match event {
                Ok(StreamEvent::Delta(text)) => {
                    on_delta(&text);
                    self.dispatch(Action::AppendDelta(text));
                    self.persist_last(false).await;
                }
                Ok(StreamEvent::Done) => {}
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        let dirty = self.dirty;
        self.dispatch(Action::SealAssistant);
        self.dirty = dirty;
        self.persist_last(true).await;
        outcome
    }

    /// Appends a batched reply, splitting out a labelled reasoning section.
    pub async fn apply_completion(&mut self, completion: ChatCompletion) -> Result<(), ClientError> {
        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.into_message())
            .ok_or(ClientError::EmptyCompletion)?;

        let extracted = extract_reasoning(&message.content);
        self.dispatch(Action::AppendAssistant {
            content: extracted.content,
            reasoning: extracted.reasoning.or(message.reasoning),
        });
        self.persist_last(true).await;
        Ok(())
    }

    /// Runs one full turn against the relay.
    pub async fn submit(
        &mut self,
        relay: &RelayClient,
        text: &str,
        streaming: bool,
        on_delta: impl FnMut(&str),
    ) -> Result<(), ClientError> {
        self.push_user(text).await;
        let history = self.conversation.messages();

        if streaming {
            let bytes = relay.stream(&history).await?;
            self.fold_stream(bytes, on_delta).await
        } else {
            let completion = relay.complete(&history).await?;
            self.apply_completion(completion).await
        }
    }
}
