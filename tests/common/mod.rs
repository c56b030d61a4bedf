#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use actix_web::{http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer};
use bytes::Bytes;
use relaychat::config::UpstreamConfig;
use serde_json::Value;

/// What the fake completion API answers with.
#[derive(Clone)]
pub enum Reply {
    Json(Value),
    Sse(Vec<&'static str>),
    Status(u16, &'static str),
}

#[derive(Debug, Clone)]
pub struct Seen {
    pub authorization: Option<String>,
    pub body: Value,
}

pub type SeenLog = Arc<Mutex<Vec<Seen>>>;

struct UpstreamState {
    reply: Reply,
    seen: SeenLog,
}

async fn upstream_handler(
    req: HttpRequest,
    body: web::Json<Value>,
    state: web::Data<UpstreamState>,
) -> HttpResponse {
    state.seen.lock().unwrap().push(Seen {
        authorization: req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: body.into_inner(),
    });

    match &state.reply {
        Reply::Json(v) => HttpResponse::Ok().json(v),
        Reply::Sse(chunks) => {
            let chunks: Vec<Result<Bytes, actix_web::Error>> = chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect();
            HttpResponse::Ok()
                .content_type("text/event-stream")
                .streaming(futures_util::stream::iter(chunks))
        }
        Reply::Status(code, body) => {
            HttpResponse::build(StatusCode::from_u16(*code).unwrap()).body(*body)
        }
    }
}

/// Starts a fake upstream on an ephemeral port and returns its base URL.
pub fn spawn_upstream(reply: Reply) -> (String, SeenLog) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = SeenLog::default();
    let state = web::Data::new(UpstreamState {
        reply,
        seen: seen.clone(),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/chat/completions", web::post().to(upstream_handler))
    })
    .workers(1)
    .listen(listener)
    .unwrap()
    .run();
    actix_web::rt::spawn(server);

    (format!("http://{addr}"), seen)
}

pub fn upstream_config(api_base: &str) -> UpstreamConfig {
    UpstreamConfig {
        api_base: api_base.to_string(),
        api_key: Some("sk-test".to_string()),
        model: "test-model".to_string(),
        system_prompt: "你是人工智能助手.".to_string(),
        timeout_secs: Some(10),
    }
}

pub fn delta_frame(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"delta": {"content": content}}]})
    )
}
