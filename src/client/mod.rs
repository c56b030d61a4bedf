//! The receiving side of the relay: posts turns to `/chat` and folds the
//! replies into a [`crate::conversation::Conversation`].

pub mod session;

pub use session::{ChatSession, PersistPolicy};

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::llm::models::{ChatCompletion, Message};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Relay { status: u16, message: String },
    #[error("Network error, please try again")]
    Network(#[from] reqwest::Error),
    #[error("Relay returned no choices")]
    EmptyCompletion,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post(&self, messages: &[Message], stream: bool) -> Result<reqwest::Response, ClientError> {
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&json!({ "messages": messages, "stream": stream }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error)
            .unwrap_or(text);
        Err(ClientError::Relay {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn complete(&self, messages: &[Message]) -> Result<ChatCompletion, ClientError> {
        Ok(self.post(messages, false).await?.json().await?)
    }

    pub async fn stream(
        &self,
        messages: &[Message],
    ) -> Result<impl Stream<Item = Result<Bytes, ClientError>>, ClientError> {
        let response = self.post(messages, true).await?;
        Ok(response.bytes_stream().map_err(ClientError::from))
    }
}
