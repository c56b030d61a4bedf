pub mod connection;
pub mod memory;
pub mod models;
pub mod service;

pub use connection::{get_connection, DbPool};
pub use memory::MemoryStore;
pub use models::*;
pub use service::DuckDbStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),
    #[error("Database connection lock poisoned")]
    Poisoned,
    #[error("Corrupt stored message: {0}")]
    Corrupt(String),
}

/// Append-keyed, per-user message log. Saves are last-write-wins per
/// message id; loads come back in timestamp order.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn save(&self, user_id: &str, message: &StoredMessage) -> Result<(), StoreError>;

    async fn load(&self, user_id: &str) -> Result<Vec<StoredMessage>, StoreError>;
}
