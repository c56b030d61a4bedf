use std::error::Error as StdError;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

use crate::api::models::ParseFailure;
use crate::llm::LlmError;

const FAILURE_PREFIX: &str = "Failed to process chat request";

/// Everything the relay can answer with besides a success.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid messages format")]
    InvalidMessages,
    #[error("{}", format_error(.0))]
    MalformedMessages(serde_json::Error),
    #[error("{0}")]
    Configuration(LlmError),
    #[error("{}", format_error(.0))]
    Upstream(LlmError),
}

impl From<LlmError> for RelayError {
    fn from(err: LlmError) -> Self {
        if err.is_configuration() {
            RelayError::Configuration(err)
        } else {
            RelayError::Upstream(err)
        }
    }
}

impl From<ParseFailure> for RelayError {
    fn from(failure: ParseFailure) -> Self {
        match failure {
            ParseFailure::InvalidShape => RelayError::InvalidMessages,
            ParseFailure::Malformed(e) => RelayError::MalformedMessages(e),
        }
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidMessages => StatusCode::BAD_REQUEST,
            RelayError::MalformedMessages(_)
            | RelayError::Configuration(_)
            | RelayError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

/// Prefixes the error's message and appends each underlying cause on its
/// own line.
pub fn format_error(err: &(dyn StdError + 'static)) -> String {
    let mut message = format!("{FAILURE_PREFIX}: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        message.push('\n');
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
