use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::Client;
use tracing::{debug, error};

use crate::config::UpstreamConfig;
use crate::llm::{
    models::{ChatCompletion, Message, UpstreamRequest},
    ByteStream, CompletionClient, LlmError,
};

const CREDENTIAL: &str = "upstream.api_key (DEEPSEEK_API_KEY)";

/// OpenAI-compatible chat-completion client for the hosted DeepSeek endpoint.
pub struct DeepSeekClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    system_prompt: String,
}

impl DeepSeekClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build().map_err(LlmError::Network)?,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    async fn send(&self, messages: &[Message], stream: bool) -> Result<reqwest::Response, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LlmError::Configuration(CREDENTIAL))?;

        if messages.is_empty() {
            return Err(LlmError::InvalidRequest("message list is empty"));
        }

        let body = UpstreamRequest::new(&self.model, &self.system_prompt, messages, stream);
        debug!(model = %self.model, messages = messages.len(), stream, "calling upstream");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(LlmError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    debug!("failed to read upstream error body: {}", e);
                    String::new()
                }
            };
            let body = if text.is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                text
            };
            error!(status = status.as_u16(), "upstream rejected request");
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionClient for DeepSeekClient {
    fn ensure_configured(&self) -> Result<(), LlmError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(LlmError::Configuration(CREDENTIAL)),
        }
    }

    async fn complete(&self, messages: &[Message]) -> Result<ChatCompletion, LlmError> {
        self.send(messages, false)
            .await?
            .json::<ChatCompletion>()
            .await
            .map_err(LlmError::Decode)
    }

    async fn complete_stream(&self, messages: &[Message]) -> Result<ByteStream, LlmError> {
        let response = self.send(messages, true).await?;
        Ok(Box::pin(response.bytes_stream().map_err(LlmError::Network)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> DeepSeekClient {
        let cfg = UpstreamConfig {
            api_key: None,
            ..UpstreamConfig::default()
        };
        DeepSeekClient::new(&cfg).unwrap()
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = unconfigured().ensure_configured().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn default_config_has_no_credential() {
        let client = DeepSeekClient::new(&UpstreamConfig::default()).unwrap();
        assert!(client.ensure_configured().unwrap_err().is_configuration());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let err = unconfigured()
            .complete(&[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn empty_history_is_rejected_locally() {
        let cfg = UpstreamConfig {
            api_key: Some("sk-test".to_string()),
            api_base: "http://127.0.0.1:9".to_string(),
            ..UpstreamConfig::default()
        };
        let client = DeepSeekClient::new(&cfg).unwrap();
        let err = client.complete_stream(&[]).await.err().unwrap();
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }

    #[test]
    fn upstream_error_shows_status_and_body() {
        let err = LlmError::Upstream {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "API error (429): rate limited");
    }
}
