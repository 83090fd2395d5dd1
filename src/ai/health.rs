//! Informational reachability probe
//!
//! Never gates acquisition; the CLI prints the result at startup and the proxy
//! reports it from `GET /api/health`.

use crate::core::config::Provider;
use reqwest::{Client, Url};
use tracing::{debug, warn};

/// Health URL on the same scheme, host and port as `endpoint`
///
/// Inference servers answer on `/health`; the proxy on `/api/health`.
pub fn health_url(endpoint: &Url, provider: Provider) -> Url {
    let mut url = endpoint.clone();
    url.set_path(match provider {
        Provider::Proxy => "/api/health",
        Provider::LlamaCpp | Provider::OpenRouter => "/health",
    });
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Outcome of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    /// 2xx answer
    Reachable,
    /// The server answered with another status
    Unhealthy(u16),
    /// No answer at all
    Unreachable(String),
}

impl Health {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Health::Reachable)
    }
}

/// `GET` the health URL with an optional bearer key
pub async fn probe(http: &Client, url: &Url, api_key: Option<&str>) -> Health {
    let mut request = http.get(url.clone());
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    match request.send().await {
        Ok(response) if response.status().is_success() => {
            debug!("[AI] Health probe {} ok", url);
            Health::Reachable
        }
        Ok(response) => {
            warn!("[AI] Health probe {} answered {}", url, response.status());
            Health::Unhealthy(response.status().as_u16())
        }
        Err(e) => {
            warn!("[AI] Health probe {} failed: {}", url, e);
            Health::Unreachable(e.to_string())
        }
    }
}
