//! Inference endpoint configuration
//!
//! Builds an [`AiConfig`] from environment variables (or any key lookup) and
//! validates it once at startup. The acquisition code only ever receives an
//! already validated config and never reads the environment itself.
//!
//! # Providers
//!
//! | Provider     | Endpoint                                        | API key  | Attempts | Base delay |
//! |--------------|-------------------------------------------------|----------|----------|------------|
//! | `llama`      | `http://llama_server:8080/v1/chat/completions`  | optional | 5        | 4s         |
//! | `openrouter` | `https://openrouter.ai/api/v1/chat/completions` | required | 3        | 2s         |
//! | `proxy`      | `http://localhost:3001/api/llama`               | unused   | 5        | 4s         |
//!
//! Every field can be overridden, see [`AiConfig::from_lookup`].

use crate::ai::retry::RetryPolicy;
use crate::core::error::{ConfigError, ConfigResult};
use reqwest::Url;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_LLAMA_URL: &str = "http://llama_server:8080/v1/chat/completions";
pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_PROXY_URL: &str = "http://localhost:3001/api/llama";

pub const DEFAULT_LLAMA_MODEL: &str = "qwen2.5-coder-7b";
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.0-flash-exp:free";

/// Where move requests are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    /// Self-hosted llama.cpp server speaking the chat-completion protocol
    #[default]
    LlamaCpp,
    /// Hosted OpenRouter API (needs a key)
    OpenRouter,
    /// The local `backend` proxy, which holds the upstream credentials
    Proxy,
}

impl Provider {
    /// Whether requests are refused without a bearer key
    pub fn requires_api_key(self) -> bool {
        matches!(self, Provider::OpenRouter)
    }

    /// Environment variable consulted for the key after `LLM_API_KEY`
    pub fn api_key_var(self) -> &'static str {
        match self {
            Provider::LlamaCpp => "LLAMA_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
            Provider::Proxy => "LLM_API_KEY",
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            Provider::LlamaCpp => DEFAULT_LLAMA_URL,
            Provider::OpenRouter => DEFAULT_OPENROUTER_URL,
            Provider::Proxy => DEFAULT_PROXY_URL,
        }
    }

    pub fn default_retry(self) -> RetryPolicy {
        match self {
            Provider::OpenRouter => RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(2000),
                jitter_max: Duration::from_millis(1000),
            },
            Provider::LlamaCpp | Provider::Proxy => RetryPolicy::default(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::LlamaCpp => "llama",
            Provider::OpenRouter => "openrouter",
            Provider::Proxy => "proxy",
        })
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llama" | "llamacpp" | "llama.cpp" => Ok(Provider::LlamaCpp),
            "openrouter" => Ok(Provider::OpenRouter),
            "proxy" | "backend" => Ok(Provider::Proxy),
            _ => Err(ConfigError::InvalidValue {
                var: "LLM_PROVIDER",
                value: s.to_string(),
                reason: "expected one of llama, openrouter, proxy".to_string(),
            }),
        }
    }
}

/// Sampling parameters sent with every completion request
///
/// Low temperature and a tiny token cap: the reply is expected to be a single
/// move token, not prose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 10,
        }
    }
}

/// Validated configuration for the move acquisition component
#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub provider: Provider,
    pub endpoint: Url,
    pub api_key: Option<String>,
    pub model: String,
    pub sampling: Sampling,
    pub retry: RetryPolicy,
    /// Sent as `HTTP-Referer` (OpenRouter app attribution)
    pub referer: Option<String>,
    /// Sent as `X-Title` (OpenRouter app attribution)
    pub app_title: Option<String>,
}

impl AiConfig {
    /// Defaults for a provider, without an API key
    pub fn for_provider(provider: Provider) -> ConfigResult<Self> {
        let endpoint = parse_url("LLM_ENDPOINT", provider.default_endpoint())?;
        let (model, referer, app_title) = match provider {
            Provider::OpenRouter => (
                DEFAULT_OPENROUTER_MODEL,
                Some("http://localhost:3000".to_string()),
                Some("Online Chess App".to_string()),
            ),
            Provider::LlamaCpp | Provider::Proxy => (DEFAULT_LLAMA_MODEL, None, None),
        };

        Ok(Self {
            provider,
            endpoint,
            api_key: None,
            model: model.to_string(),
            sampling: Sampling::default(),
            retry: provider.default_retry(),
            referer,
            app_title,
        })
    }

    /// Read and validate configuration from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read and validate configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match get("LLM_PROVIDER") {
            Some(value) => value.parse()?,
            None => Provider::default(),
        };
        let mut config = Self::for_provider(provider)?;

        let endpoint = get("LLM_ENDPOINT").or_else(|| match provider {
            Provider::LlamaCpp => get("LLAMA_SERVER_URL"),
            _ => None,
        });
        if let Some(endpoint) = endpoint {
            config.endpoint = parse_url("LLM_ENDPOINT", &endpoint)?;
        }

        config.api_key = get("LLM_API_KEY").or_else(|| get(provider.api_key_var()));

        if let Some(model) = get("LLM_MODEL") {
            config.model = model;
        }
        if let Some(value) = get("LLM_TEMPERATURE") {
            config.sampling.temperature = parse_number("LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = get("LLM_MAX_TOKENS") {
            config.sampling.max_tokens = parse_number("LLM_MAX_TOKENS", &value)?;
        }
        if let Some(value) = get("LLM_MAX_RETRIES") {
            config.retry.max_attempts = parse_number("LLM_MAX_RETRIES", &value)?;
        }
        if let Some(value) = get("LLM_RETRY_BASE_MS") {
            config.retry.base_delay =
                Duration::from_millis(parse_number("LLM_RETRY_BASE_MS", &value)?);
        }
        if let Some(value) = get("LLM_RETRY_JITTER_MS") {
            config.retry.jitter_max =
                Duration::from_millis(parse_number("LLM_RETRY_JITTER_MS", &value)?);
        }
        if let Some(referer) = get("LLM_REFERER") {
            config.referer = Some(referer);
        }
        if let Some(title) = get("LLM_APP_TITLE") {
            config.app_title = Some(title);
        }

        config.validate()?;
        info!(
            "[CONFIG] provider={} endpoint={} model={} attempts={} api_key={}",
            config.provider,
            config.endpoint,
            config.model,
            config.retry.max_attempts,
            if config.api_key.is_some() {
                "configured"
            } else {
                "not configured"
            }
        );
        Ok(config)
    }

    /// Check every invariant the acquisition component relies on
    pub fn validate(&self) -> ConfigResult<()> {
        if !matches!(self.endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                reason: format!("endpoint must be http(s), got {}", self.endpoint),
            });
        }
        if self.provider.requires_api_key() && self.api_key.is_none() {
            return Err(ConfigError::MissingApiKey {
                provider: self.provider,
                var: self.provider.api_key_var(),
            });
        }
        if self.provider != Provider::Proxy && self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "model must not be empty".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.sampling.temperature) {
            return Err(ConfigError::Invalid {
                reason: "temperature must be within 0.0..=2.0".to_string(),
            });
        }
        if self.sampling.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                reason: "max_tokens must be > 0".to_string(),
            });
        }
        if self.sampling.temperature > 1.0 {
            warn!(
                "[CONFIG] temperature {} is high for single-token move replies",
                self.sampling.temperature
            );
        }
        self.retry.validate()
    }
}

fn parse_url(var: &'static str, value: &str) -> ConfigResult<Url> {
    Url::parse(value.trim()).map_err(|e| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_number<T>(var: &'static str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_llama_provider() {
        //! An empty environment yields the self-hosted llama.cpp setup
        let config = AiConfig::from_lookup(lookup(&[])).expect("defaults are valid");
        assert_eq!(config.provider, Provider::LlamaCpp);
        assert_eq!(config.endpoint.as_str(), DEFAULT_LLAMA_URL);
        assert_eq!(config.model, DEFAULT_LLAMA_MODEL);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_secs(4));
        assert_eq!(config.sampling, Sampling::default());
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_llama_server_url_is_honoured() {
        let config = AiConfig::from_lookup(lookup(&[(
            "LLAMA_SERVER_URL",
            "http://10.0.0.5:8080/v1/chat/completions",
        )]))
        .unwrap();
        assert_eq!(config.endpoint.host_str(), Some("10.0.0.5"));
    }

    #[test]
    fn test_openrouter_requires_api_key() {
        //! Hosted providers refuse to start without credentials
        let err = AiConfig::from_lookup(lookup(&[("LLM_PROVIDER", "openrouter")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingApiKey {
                provider: Provider::OpenRouter,
                var: "OPENROUTER_API_KEY",
            }
        );
    }

    #[test]
    fn test_openrouter_with_key() {
        let config = AiConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "openrouter"),
            ("OPENROUTER_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.model, DEFAULT_OPENROUTER_MODEL);
        assert_eq!(config.app_title.as_deref(), Some("Online Chess App"));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = AiConfig::from_lookup(lookup(&[
            ("LLM_MAX_RETRIES", "2"),
            ("LLM_RETRY_BASE_MS", "10"),
            ("LLM_RETRY_JITTER_MS", "5"),
            ("LLM_TEMPERATURE", "0.0"),
            ("LLM_MAX_TOKENS", "8"),
            ("LLM_MODEL", "tiny"),
        ]))
        .unwrap();
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.base_delay, Duration::from_millis(10));
        assert_eq!(config.retry.jitter_max, Duration::from_millis(5));
        assert_eq!(config.sampling.temperature, 0.0);
        assert_eq!(config.sampling.max_tokens, 8);
        assert_eq!(config.model, "tiny");
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let err = AiConfig::from_lookup(lookup(&[("LLM_PROVIDER", "gemini")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: "LLM_PROVIDER",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_unparsable_numbers() {
        let err = AiConfig::from_lookup(lookup(&[("LLM_MAX_RETRIES", "many")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: "LLM_MAX_RETRIES",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_zero_attempts_and_delays() {
        for (var, value) in [
            ("LLM_MAX_RETRIES", "0"),
            ("LLM_RETRY_BASE_MS", "0"),
            ("LLM_RETRY_JITTER_MS", "0"),
            ("LLM_MAX_TOKENS", "0"),
            ("LLM_TEMPERATURE", "3.5"),
        ] {
            let result = AiConfig::from_lookup(lookup(&[(var, value)]));
            assert!(
                matches!(result, Err(ConfigError::Invalid { .. })),
                "{var}={value} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let err = AiConfig::from_lookup(lookup(&[("LLM_ENDPOINT", "ftp://example.com/x")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_rejects_jitter_that_could_shrink_delays() {
        //! A 1ms base with the default 1s jitter would let delays decrease
        let err = AiConfig::from_lookup(lookup(&[("LLM_RETRY_BASE_MS", "1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err:?}");

        let config = AiConfig::from_lookup(lookup(&[
            ("LLM_RETRY_BASE_MS", "1"),
            ("LLM_RETRY_JITTER_MS", "2"),
        ]))
        .unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let delays: Vec<_> = (1..=5)
                .map(|n| config.retry.delay_for(n, &mut rng))
                .collect();
            assert!(delays.windows(2).all(|w| w[0] <= w[1]), "{delays:?}");
        }
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = AiConfig::from_lookup(lookup(&[("LLM_MODEL", "   ")])).unwrap();
        assert_eq!(config.model, DEFAULT_LLAMA_MODEL);
    }

    #[test]
    fn test_provider_round_trips_through_display() {
        for provider in [Provider::LlamaCpp, Provider::OpenRouter, Provider::Proxy] {
            assert_eq!(provider.to_string().parse::<Provider>().unwrap(), provider);
        }
    }
}
