pub mod deepseek;
pub mod models;
pub mod reasoning;

pub use deepseek::DeepSeekClient;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use thiserror::Error;

use models::{ChatCompletion, Message};

/// Raw upstream response body in streaming mode.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, LlmError>> + Send>>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0} is not configured")]
    Configuration(&'static str),
    #[error("Invalid request: {0}")]
    InvalidRequest(&'static str),
    #[error("API error ({status}): {body}")]
    Upstream { status: u16, body: String },
    #[error("Network error")]
    Network(#[source] reqwest::Error),
    #[error("Malformed upstream response")]
    Decode(#[source] reqwest::Error),
}

impl LlmError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::Configuration(_))
    }
}

/// Upstream chat-completion API. One outbound call per invocation, no retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Fails with [`LlmError::Configuration`] when the credential is absent.
    fn ensure_configured(&self) -> Result<(), LlmError>;

    async fn complete(&self, messages: &[Message]) -> Result<ChatCompletion, LlmError>;

    async fn complete_stream(&self, messages: &[Message]) -> Result<ByteStream, LlmError>;
}
