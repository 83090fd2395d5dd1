//! Proxy settings, read once at startup

use llmchess::core::config::{DEFAULT_LLAMA_MODEL, DEFAULT_LLAMA_URL};
use llmchess::core::{ConfigError, ConfigResult};
use reqwest::Url;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_STATIC_DIR: &str = "dist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub port: u16,
    /// Chat-completion URL of the inference server
    pub upstream: Url,
    pub api_key: Option<String>,
    pub model: String,
    /// Built front end, served with an `index.html` fallback
    pub static_dir: PathBuf,
}

impl ProxyConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("BACKEND_PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    var: "BACKEND_PORT",
                    value,
                    reason: e.to_string(),
                })?,
            None => DEFAULT_PORT,
        };

        let upstream_raw = get("LLAMA_SERVER_URL").unwrap_or_else(|| DEFAULT_LLAMA_URL.to_string());
        let upstream = Url::parse(upstream_raw.trim()).map_err(|e| ConfigError::InvalidValue {
            var: "LLAMA_SERVER_URL",
            value: upstream_raw.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(upstream.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                var: "LLAMA_SERVER_URL",
                value: upstream_raw,
                reason: "must be an http(s) URL".to_string(),
            });
        }

        Ok(Self {
            port,
            upstream,
            api_key: get("LLAMA_API_KEY"),
            model: get("LLAMA_MODEL").unwrap_or_else(|| DEFAULT_LLAMA_MODEL.to_string()),
            static_dir: PathBuf::from(
                get("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            ),
        })
    }
}
