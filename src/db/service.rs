use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::{params, types::Type, Connection, Result as DbResult, Row};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db::{connection, models::StoredMessage, ConversationStore, DbPool, StoreError};
use crate::llm::models::Role;

pub struct DbService;

impl DbService {
    fn row_to_message(row: &Row) -> DbResult<StoredMessage> {
        let id: String = row.get(0)?;
        let role: String = row.get(2)?;
        let created: String = row.get(5)?;

        let id = Uuid::parse_str(&id)
            .map_err(|e| duckdb::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
        let role = match role.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            other => {
                return Err(duckdb::Error::FromSqlConversionFailure(
                    2,
                    Type::Text,
                    Box::new(StoreError::Corrupt(format!("unknown role {other:?}"))),
                ))
            }
        };
        let timestamp = DateTime::parse_from_rfc3339(&created)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| duckdb::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        Ok(StoredMessage {
            id,
            position: row.get(1)?,
            role,
            content: row.get(3)?,
            reasoning: row.get::<_, Option<String>>(4)?,
            timestamp,
        })
    }

    /// Inserts the message, or overwrites content and reasoning of the row
    /// already holding this message id.
    pub fn upsert_message(conn: &Connection, user_id: &str, message: &StoredMessage) -> DbResult<()> {
        conn.execute(
            "INSERT INTO messages (id, user_id, position, role, content, reasoning, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET content = excluded.content, reasoning = excluded.reasoning",
            params![
                message.id.to_string(),
                user_id,
                message.position,
                message.role.as_str(),
                message.content,
                message.reasoning,
                message.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )?;
        Ok(())
    }

    pub fn get_messages(conn: &Connection, user_id: &str) -> DbResult<Vec<StoredMessage>> {
        let mut stmt = conn.prepare(
            "SELECT id, position, role, content, reasoning, created_at
             FROM messages
             WHERE user_id = ?
             ORDER BY created_at ASC, position ASC",
        )?;

        let rows = stmt.query_map(params![user_id], Self::row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub fn delete_messages(conn: &Connection, user_id: &str) -> DbResult<usize> {
        conn.execute("DELETE FROM messages WHERE user_id = ?", params![user_id])
    }
}

/// DuckDB-backed conversation log keyed by user id.
#[derive(Clone)]
pub struct DuckDbStore {
    pool: DbPool,
}

impl DuckDbStore {
    pub fn open(config: &DatabaseConfig) -> Result<Self, StoreError> {
        Ok(Self {
            pool: connection::get_connection(config)?,
        })
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn clear(&self, user_id: &str) -> Result<usize, StoreError> {
        let conn = self.pool.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(DbService::delete_messages(&conn, user_id)?)
    }
}

#[async_trait]
impl ConversationStore for DuckDbStore {
    async fn save(&self, user_id: &str, message: &StoredMessage) -> Result<(), StoreError> {
        let conn = self.pool.lock().map_err(|_| StoreError::Poisoned)?;
        DbService::upsert_message(&conn, user_id, message)?;
        Ok(())
    }

    async fn load(&self, user_id: &str) -> Result<Vec<StoredMessage>, StoreError> {
        let conn = self.pool.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(DbService::get_messages(&conn, user_id)?)
    }
}
