use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            reasoning: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            reasoning: None,
        }
    }
}

/// Message as the upstream API sees it. `reasoning` never leaves the client.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UpstreamRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<UpstreamMessage<'a>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl<'a> UpstreamRequest<'a> {
    pub fn new(model: &'a str, system_prompt: &'a str, history: &'a [Message], stream: bool) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(UpstreamMessage {
            role: "system",
            content: system_prompt,
        });
        messages.extend(history.iter().map(|m| UpstreamMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));

        Self {
            model,
            messages,
            stream,
        }
    }
}

/// Fully materialized completion. Fields other than `choices` are kept as-is
/// so the relay can hand the body back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub message: CompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Assistant message inside a batched completion. Everything besides role
/// and content is kept verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CompletionMessage {
    /// DeepSeek reasoning models report their trace as `reasoning_content`.
    pub fn into_message(self) -> Message {
        let reasoning = ["reasoning", "reasoning_content"]
            .iter()
            .find_map(|key| self.extra.get(*key).and_then(|v| v.as_str()))
            .map(String::from);

        Message {
            role: self.role,
            content: self.content,
            reasoning,
        }
    }
}

// Streaming frames: `data: {"choices":[{"delta":{"content":"..."}}]}`
#[derive(Debug, Deserialize)]
pub struct StreamFrame {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamDelta {
    pub content: Option<String>,
}

impl StreamFrame {
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|c| !c.is_empty())
    }
}
