use std::sync::Arc;

use actix_web::{get, http::header, post, web, HttpResponse};
use futures_util::TryStreamExt;
use serde_json::json;
use tracing::{error, info};

use crate::api::{error::RelayError, models::ChatRequest};
use crate::llm::CompletionClient;

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "healthy"}))
}

/// Relays a chat turn upstream. Streaming replies are passed through byte for
/// byte; batched replies are returned as the upstream JSON.
#[post("/chat")]
pub async fn chat(
    llm: web::Data<Arc<dyn CompletionClient>>,
    body: web::Bytes,
) -> Result<HttpResponse, RelayError> {
    let req = ChatRequest::parse(&body).map_err(|failure| {
        let err = RelayError::from(failure);
        if let RelayError::MalformedMessages(e) = &err {
            error!("Chat API error: {}", e);
        }
        err
    })?;

    if let Err(e) = llm.ensure_configured() {
        error!("Chat API configuration error: {}", e);
        return Err(e.into());
    }

    info!(messages = req.messages.len(), stream = req.stream, "relaying chat request");

    if req.stream {
        let upstream = llm.complete_stream(&req.messages).await.map_err(|e| {
            error!("Chat API error: {}", e);
            RelayError::from(e)
        })?;

        let body = upstream.inspect_err(|e| error!("Upstream stream aborted: {}", e));

        Ok(HttpResponse::Ok()
            .content_type("text/event-stream")
            .insert_header((header::CACHE_CONTROL, "no-cache"))
            .insert_header((header::CONNECTION, "keep-alive"))
            .streaming(body))
    } else {
        let completion = llm.complete(&req.messages).await.map_err(|e| {
            error!("Chat API error: {}", e);
            RelayError::from(e)
        })?;

        Ok(HttpResponse::Ok().json(completion))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(chat);
}
