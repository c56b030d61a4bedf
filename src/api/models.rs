use serde::Deserialize;
use serde_json::Value;

use crate::llm::models::Message;

/// Relay request body: `{"messages": [...], "stream": bool?}`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug)]
pub enum ParseFailure {
    /// `messages` is absent, not a list, or empty.
    InvalidShape,
    /// The list is there but an element (or `stream`) does not deserialize.
    Malformed(serde_json::Error),
}

impl ChatRequest {
    pub fn parse(body: &[u8]) -> Result<Self, ParseFailure> {
        let value: Value = serde_json::from_slice(body).map_err(|_| ParseFailure::InvalidShape)?;
        match value.get("messages") {
            Some(Value::Array(list)) if !list.is_empty() => {}
            _ => return Err(ParseFailure::InvalidShape),
        }
        serde_json::from_value(value).map_err(ParseFailure::Malformed)
    }
}
