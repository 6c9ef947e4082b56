//! Client configuration and per-request generation options.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

/// Default model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Default timeout for connecting and receiving response headers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable consulted when no API key is passed explicitly.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Inclusive range accepted for the default temperature.
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=2.0;

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Inputs for constructing a [`DeepSeekClient`](crate::DeepSeekClient).
///
/// # Example
/// ```rust
/// use deepseek_client::options::ClientOptions;
/// use std::time::Duration;
///
/// let options = ClientOptions::new()
///     .with_api_key("sk-...")
///     .with_default_model("deepseek-reasoner")
///     .with_timeout(Duration::from_secs(60));
/// assert_eq!(options.default_model, "deepseek-reasoner");
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API key. Falls back to `DEEPSEEK_API_KEY` when `None` or empty.
    pub api_key: Option<SecretString>,

    /// Base URL for API endpoints. Trailing slashes are stripped by the client.
    pub base_url: String,

    /// Model used when a request does not override it
    pub default_model: String,

    /// Temperature used when a request does not override it (0.0 - 2.0)
    pub default_temperature: f64,

    /// Bound on connection and response-header acquisition
    pub timeout: Duration,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers sent with every request
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            default_temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            extra_headers: None,
        }
    }
}

impl ClientOptions {
    /// Create options with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the default model.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the default temperature. Checked when the client is built.
    pub fn with_default_temperature(mut self, temperature: f64) -> Self {
        self.default_temperature = temperature;
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Resolve the API key: the explicit key if non-empty, otherwise the
    /// environment variable if non-empty.
    pub(crate) fn resolve_api_key(&self) -> Option<SecretString> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| {
                std::env::var(API_KEY_ENV)
                    .ok()
                    .filter(|key| !key.is_empty())
                    .map(SecretString::new)
            })
    }
}

/// Per-request sampling parameters for `generate` and `chat`.
///
/// `model` and `temperature` fall back to the client defaults when `None`.
/// Entries in `extra` are merged into the request body last, so they can
/// overwrite any computed field. They only change the body: whether the
/// reply is read as a stream is decided by `stream` alone.
///
/// # Example
/// ```rust
/// use deepseek_client::options::GenerationOptions;
///
/// let options = GenerationOptions::new()
///     .with_max_tokens(100)
///     .with_extra("stop", vec!["\n\n"]);
/// assert_eq!(options.max_tokens, 100);
/// assert!(options.extra.contains_key("stop"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Model override. An empty string falls back to the client default.
    pub model: Option<String>,

    /// Temperature override. Not range-checked; the provider decides.
    pub temperature: Option<f64>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Nucleus sampling threshold
    pub top_p: f64,

    /// Presence penalty
    pub presence_penalty: f64,

    /// Return a live stream handle instead of a parsed envelope
    pub stream: bool,

    /// Provider-specific fields passed through uninterpreted
    pub extra: Map<String, Value>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: None,
            max_tokens: 1024,
            top_p: 1.0,
            presence_penalty: 0.0,
            stream: false,
            extra: Map::new(),
        }
    }
}

impl GenerationOptions {
    /// Create options with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model override.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature override.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set top-p sampling parameter.
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set the presence penalty.
    pub fn with_presence_penalty(mut self, presence_penalty: f64) -> Self {
        self.presence_penalty = presence_penalty;
        self
    }

    /// Enable or disable streaming.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Add one provider-specific field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_is_redacted() {
        let secret = SecretString::from("sk-live");
        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(secret.expose_secret(), "sk-live");
    }

    #[test]
    fn test_client_options_defaults() {
        let options = ClientOptions::default();
        assert!(options.api_key.is_none());
        assert_eq!(options.base_url, "https://api.deepseek.com/v1");
        assert_eq!(options.default_model, "deepseek-chat");
        assert_eq!(options.default_temperature, 0.7);
        assert_eq!(options.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let options = ClientOptions::new().with_api_key("explicit");
        let key = options.resolve_api_key().unwrap();
        assert_eq!(key.expose_secret(), "explicit");
    }

    #[test]
    fn test_with_header_accumulates() {
        let options = ClientOptions::new()
            .with_header("X-One", "1")
            .with_header("X-Two", "2");
        let headers = options.extra_headers.unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["X-Two"], "2");
    }

    #[test]
    fn test_generation_options_defaults() {
        let options = GenerationOptions::default();
        assert_eq!(options.model, None);
        assert_eq!(options.temperature, None);
        assert_eq!(options.max_tokens, 1024);
        assert_eq!(options.top_p, 1.0);
        assert_eq!(options.presence_penalty, 0.0);
        assert!(!options.stream);
        assert!(options.extra.is_empty());
    }

    #[test]
    fn test_with_extra_replaces_same_key() {
        let options = GenerationOptions::new()
            .with_extra("seed", 1)
            .with_extra("seed", 2);
        assert_eq!(options.extra["seed"], Value::from(2));
    }
}
