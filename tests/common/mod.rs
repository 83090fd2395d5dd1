//! Shared helpers for integration tests
//!
//! A stub inference server on a random local port. Every `POST` pops the next
//! scripted `(status, body)` and records the request body.

#![allow(dead_code)]

use axum::{http::StatusCode, routing::post, Json, Router};
use llmchess::core::AiConfig;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub struct StubServer {
    pub url: String,
    seen: Arc<Mutex<Vec<Value>>>,
}

impl StubServer {
    /// Serve `script` on `path`
    pub async fn start(path: &str, script: Vec<(u16, Value)>) -> Self {
        let script = Arc::new(Mutex::new(VecDeque::from(script)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();

        let app = Router::new().route(
            path,
            post(move |Json(body): Json<Value>| {
                let script = script.clone();
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(body);
                    let (status, reply) = script
                        .lock()
                        .unwrap()
                        .pop_front()
                        .unwrap_or((500, json!({"error": "script exhausted"})));
                    (StatusCode::from_u16(status).unwrap(), Json(reply))
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}{path}"),
            seen,
        }
    }

    /// Chat-completion endpoint
    pub async fn completions(script: Vec<(u16, Value)>) -> Self {
        Self::start("/v1/chat/completions", script).await
    }

    /// Proxy `POST /api/llama`
    pub async fn proxy(script: Vec<(u16, Value)>) -> Self {
        Self::start("/api/llama", script).await
    }

    pub fn requests(&self) -> Vec<Value> {
        self.seen.lock().unwrap().clone()
    }
}

pub fn completion(content: &str) -> Value {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
}

/// Config pointing at `url` with millisecond backoff
pub fn fast_config(provider: &str, url: &str, max_attempts: u32) -> AiConfig {
    let pairs = [
        ("LLM_PROVIDER", provider.to_string()),
        ("LLM_ENDPOINT", url.to_string()),
        ("LLM_API_KEY", "test-key".to_string()),
        ("LLM_MAX_RETRIES", max_attempts.to_string()),
        ("LLM_RETRY_BASE_MS", "1".to_string()),
        ("LLM_RETRY_JITTER_MS", "1".to_string()),
    ];
    AiConfig::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}
