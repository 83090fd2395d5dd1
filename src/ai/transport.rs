//! HTTP transport to the inference endpoint
//!
//! One `POST` with a JSON body per attempt, one JSON reply back. Two wire
//! shapes are supported behind the [`MoveEndpoint`] trait:
//!
//! - [`ChatCompletionsClient`]: talks the chat-completion protocol directly
//!   (llama.cpp server, OpenRouter, any compatible API)
//! - [`ProxyClient`]: talks to the local `backend` proxy, which keeps
//!   credentials and the upstream location out of the client
//!
//! Failures come back already classified (see [`classify_failure`]), so the
//! retry loop never has to look at error wording.

use super::error::{classify_failure, TransportError};
use super::prompt::Prompt;
use crate::core::config::{AiConfig, Provider, Sampling};
use crate::core::error::{ConfigError, ConfigResult};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Chat message in a completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of a chat-completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, prompt: &Prompt, sampling: Sampling) -> Self {
        Self {
            model: model.into(),
            messages: vec![
                ChatMessage::system(prompt.system.clone()),
                ChatMessage::user(prompt.user.clone()),
            ],
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        }
    }
}

/// Body of a chat-completion response
///
/// Every level is optional so that a structurally odd reply surfaces as an
/// empty response rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Body accepted by the proxy's `POST /api/llama`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyMoveRequest {
    pub system_message: String,
    pub user_message: String,
}

/// Success body of the proxy's `POST /api/llama`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyMoveResponse {
    #[serde(rename = "move", default)]
    pub san: Option<String>,
}

/// Failure body of the proxy's `POST /api/llama`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyErrorResponse {
    pub error: String,
    pub message: String,
}

/// A successful (2xx) reply from either endpoint shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Completion(ChatCompletionResponse),
    Proxied(ProxyMoveResponse),
}

/// Something that answers move prompts
///
/// One call is one attempt. Implementations must not retry internally.
#[async_trait]
pub trait MoveEndpoint: Send + Sync {
    async fn request(&self, prompt: &Prompt) -> Result<Reply, TransportError>;

    /// Human readable location, used in error messages
    fn describe(&self) -> String;
}

/// Direct chat-completion client
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: Client,
    endpoint: Url,
    model: String,
    sampling: Sampling,
    api_key: Option<String>,
    referer: Option<String>,
    app_title: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(http: Client, endpoint: Url, model: impl Into<String>, sampling: Sampling) -> Self {
        Self {
            http,
            endpoint,
            model: model.into(),
            sampling,
            api_key: None,
            referer: None,
            app_title: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_attribution(mut self, referer: Option<String>, app_title: Option<String>) -> Self {
        self.referer = referer;
        self.app_title = app_title;
        self
    }
}

#[async_trait]
impl MoveEndpoint for ChatCompletionsClient {
    async fn request(&self, prompt: &Prompt) -> Result<Reply, TransportError> {
        let body = ChatCompletionRequest::new(self.model.clone(), prompt, self.sampling);

        let mut request = self.http.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(referer) = &self.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.app_title {
            request = request.header("X-Title", title);
        }

        debug!("[AI] POST {} model={}", self.endpoint, self.model);
        let response = request.send().await.map_err(network_error)?;
        read_json(response).await.map(Reply::Completion)
    }

    fn describe(&self) -> String {
        self.endpoint.to_string()
    }
}

/// Client for the local proxy
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: Client,
    endpoint: Url,
}

impl ProxyClient {
    pub fn new(http: Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl MoveEndpoint for ProxyClient {
    async fn request(&self, prompt: &Prompt) -> Result<Reply, TransportError> {
        let body = ProxyMoveRequest {
            system_message: prompt.system.clone(),
            user_message: prompt.user.clone(),
        };

        debug!("[AI] POST {} (proxy)", self.endpoint);
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        read_json(response).await.map(Reply::Proxied)
    }

    fn describe(&self) -> String {
        self.endpoint.to_string()
    }
}

/// Build the endpoint client a validated config asks for
pub fn endpoint_from_config(config: &AiConfig) -> ConfigResult<Box<dyn MoveEndpoint>> {
    let http = Client::builder()
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

    let endpoint: Box<dyn MoveEndpoint> = match config.provider {
        Provider::Proxy => Box::new(ProxyClient::new(http, config.endpoint.clone())),
        Provider::LlamaCpp | Provider::OpenRouter => Box::new(
            ChatCompletionsClient::new(
                http,
                config.endpoint.clone(),
                config.model.clone(),
                config.sampling,
            )
            .with_api_key(config.api_key.clone())
            .with_attribution(config.referer.clone(), config.app_title.clone()),
        ),
    };
    Ok(endpoint)
}

fn network_error(err: reqwest::Error) -> TransportError {
    // A reqwest error carrying a status only happens after `error_for_status`,
    // which we never call, so anything here is connect or IO level.
    classify_failure(err.status().map(|s| s.as_u16()), err.to_string())
}

/// Check the status, then decode the body as `T`
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(network_error)?;

    if !status.is_success() {
        let message = error_message(&bytes)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        return Err(classify_failure(Some(status.as_u16()), message));
    }

    serde_json::from_slice(&bytes).map_err(|e| TransportError::Malformed(e.to_string()))
}

/// Pull a human readable message out of an error body
///
/// Understands `{error:{message}}` (chat-completion APIs), `{error, message}`
/// (our proxy) and `{error: "..."}`.
pub fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| value.get("message").and_then(Value::as_str))
        .or_else(|| value.get("error").and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        //! Wire format matches the chat-completion contract
        let prompt = Prompt {
            system: "sys".to_string(),
            user: "usr".to_string(),
        };
        let body = ChatCompletionRequest::new("qwen2.5-coder-7b", &prompt, Sampling::default());
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["model"], "qwen2.5-coder-7b");
        assert_eq!(value["messages"][0], json!({"role": "system", "content": "sys"}));
        assert_eq!(value["messages"][1], json!({"role": "user", "content": "usr"}));
        assert_eq!(value["max_tokens"], 10);
        assert!((value["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_proxy_request_uses_camel_case() {
        let body = ProxyMoveRequest {
            system_message: "a".to_string(),
            user_message: "b".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"systemMessage": "a", "userMessage": "b"})
        );
    }

    #[test]
    fn test_proxy_response_reads_move_field() {
        let reply: ProxyMoveResponse = serde_json::from_str(r#"{"move":"Nf3"}"#).unwrap();
        assert_eq!(reply.san.as_deref(), Some("Nf3"));
        let empty: ProxyMoveResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.san.is_none());
    }

    #[test]
    fn test_completion_response_tolerates_missing_levels() {
        let reply: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert_eq!(reply.choices.len(), 1);
        assert!(reply.choices[0].message.as_ref().unwrap().content.is_none());

        let reply: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(reply.choices.is_empty());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(br#"{"error":{"message":"Rate limit exceeded"}}"#).as_deref(),
            Some("Rate limit exceeded")
        );
        assert_eq!(
            error_message(br#"{"error":"Failed to connect to llama server","message":"boom"}"#)
                .as_deref(),
            Some("boom")
        );
        assert_eq!(
            error_message(br#"{"error":"plain"}"#).as_deref(),
            Some("plain")
        );
        assert_eq!(error_message(b"<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_endpoint_from_config_describes_url() {
        let config = AiConfig::for_provider(Provider::Proxy).unwrap();
        let endpoint = endpoint_from_config(&config).unwrap();
        assert_eq!(endpoint.describe(), "http://localhost:3001/api/llama");
    }
}
