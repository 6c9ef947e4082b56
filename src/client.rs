//! The API client and its error type.

use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::http::{build_headers, build_http_client, read_envelope};
use crate::model::{Envelope, Message, ModelDescriptor};
use crate::options::{ClientOptions, GenerationOptions, API_KEY_ENV, TEMPERATURE_RANGE};
use crate::stream::{LineStream, StreamHandle};

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API Error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Timed out after {0:?} waiting for response")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result of `generate` or `chat`.
#[derive(Debug)]
pub enum Completion {
    /// Parsed body of a non-streaming call
    Envelope(Envelope),
    /// Live response of a streaming call, not yet read
    Stream(StreamHandle),
}

impl Completion {
    /// The parsed envelope, or `None` for a streaming call.
    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            Completion::Envelope(envelope) => Some(envelope),
            Completion::Stream(_) => None,
        }
    }

    /// The stream handle, or `None` for a non-streaming call.
    pub fn into_stream(self) -> Option<StreamHandle> {
        match self {
            Completion::Envelope(_) => None,
            Completion::Stream(handle) => Some(handle),
        }
    }
}

/// Client for the DeepSeek HTTP API.
///
/// Headers and the underlying HTTP client are built once and shared by
/// every request. The two setters are the only mutators and take `&mut self`,
/// so they can never run while a request borrows the client.
///
/// # Example
/// ```no_run
/// use deepseek_client::{DeepSeekClient, GenerationOptions, Message};
/// use deepseek_client::options::ClientOptions;
///
/// # async fn run() -> Result<(), deepseek_client::ClientError> {
/// let client = DeepSeekClient::new(ClientOptions::new().with_api_key("sk-..."))?;
/// let reply = client
///     .chat(&[Message::user("Hello!")], GenerationOptions::new())
///     .await?;
/// println!("{:?}", reply.into_envelope());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DeepSeekClient {
    http: reqwest::Client,
    headers: HeaderMap,
    base_url: String,
    default_model: String,
    default_temperature: f64,
    timeout: Duration,
}

impl DeepSeekClient {
    /// Build a client from options.
    ///
    /// Fails with [`ClientError::Config`] when no API key is given and
    /// `DEEPSEEK_API_KEY` is unset or empty, and with
    /// [`ClientError::Validation`] when the default temperature is out of range.
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let api_key = options.resolve_api_key().ok_or_else(|| {
            ClientError::Config(format!(
                "API key required. Set {} environment variable or provide explicitly.",
                API_KEY_ENV
            ))
        })?;
        check_temperature(options.default_temperature)?;

        let headers = build_headers(&api_key, &options.extra_headers)?;
        let http = build_http_client(&options, headers.clone())?;

        Ok(Self {
            http,
            headers,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            default_model: options.default_model,
            default_temperature: options.default_temperature,
            timeout: options.timeout,
        })
    }

    /// Build a client with default options, reading the key from `DEEPSEEK_API_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientOptions::default())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn default_temperature(&self) -> f64 {
        self.default_temperature
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Text completion against `{base}/completions`.
    pub async fn generate(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<Completion, ClientError> {
        let stream = options.stream;
        let payload = self.build_payload("prompt", Value::from(prompt), options);
        self.post("completions", payload, stream).await
    }

    /// Chat completion against `{base}/chat/completions`.
    ///
    /// Messages are sent in the given order, unmodified.
    pub async fn chat(
        &self,
        messages: &[Message],
        options: GenerationOptions,
    ) -> Result<Completion, ClientError> {
        let stream = options.stream;
        let payload = self.build_payload("messages", serde_json::to_value(messages)?, options);
        self.post("chat/completions", payload, stream).await
    }

    /// Turn a streaming response into a stream of non-empty text lines.
    ///
    /// Lines are passed through verbatim, framing prefix included.
    pub fn consume_stream(&self, handle: StreamHandle) -> LineStream {
        handle.into_lines()
    }

    /// List the models available to this key.
    ///
    /// Returns the envelope's `data` list, or an empty list when it is absent.
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>, ClientError> {
        let url = self.endpoint("models");
        debug!(method = "GET", url = %url, "sending request");

        let response = self
            .send(self.http.get(&url).timeout(self.timeout))
            .await?;
        let mut envelope = read_envelope(response).await?;

        match envelope.remove("data") {
            None => Ok(Vec::new()),
            Some(Value::Array(models)) => Ok(models),
            Some(other) => Err(ClientError::UnexpectedResponse(format!(
                "expected `data` to be a list, got {}",
                other
            ))),
        }
    }

    /// Update the model used by later requests that do not name one.
    pub fn set_default_model(&mut self, model: impl Into<String>) {
        self.default_model = model.into();
    }

    /// Update the temperature used by later requests that do not set one.
    ///
    /// Fails with [`ClientError::Validation`] outside [0.0, 2.0].
    pub fn set_default_temperature(&mut self, temperature: f64) -> Result<(), ClientError> {
        check_temperature(temperature)?;
        self.default_temperature = temperature;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Build a request body. `extra` goes in last and may overwrite any field.
    /// An empty model override counts as no override.
    fn build_payload(
        &self,
        input_key: &str,
        input: Value,
        options: GenerationOptions,
    ) -> Map<String, Value> {
        let model = options
            .model
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| self.default_model.clone());

        let mut payload = Map::new();
        payload.insert("model".to_string(), Value::from(model));
        payload.insert(input_key.to_string(), input);
        payload.insert(
            "temperature".to_string(),
            Value::from(options.temperature.unwrap_or(self.default_temperature)),
        );
        payload.insert("max_tokens".to_string(), Value::from(options.max_tokens));
        payload.insert("top_p".to_string(), Value::from(options.top_p));
        payload.insert(
            "presence_penalty".to_string(),
            Value::from(options.presence_penalty),
        );
        payload.insert("stream".to_string(), Value::from(options.stream));
        payload.extend(options.extra);
        payload
    }

    /// Send a completion request. `stream` comes from the typed options, so
    /// a `stream` entry in `extra` changes the body but not how the reply is read.
    async fn post(
        &self,
        path: &str,
        payload: Map<String, Value>,
        stream: bool,
    ) -> Result<Completion, ClientError> {
        let url = self.endpoint(path);
        let model = payload
            .get("model")
            .and_then(|model| model.as_str())
            .unwrap_or_default();
        debug!(method = "POST", url = %url, model, stream, "sending request");

        let mut request = self.http.post(&url).json(&payload);
        if stream {
            let response = self.send(request).await?;
            debug!(status = response.status().as_u16(), "stream opened");
            return Ok(Completion::Stream(StreamHandle::new(response)));
        }

        request = request.timeout(self.timeout);
        let response = self.send(request).await?;
        Ok(Completion::Envelope(read_envelope(response).await?))
    }

    /// Send a request, bounding the wait for response headers.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))?
            .map_err(ClientError::from)
    }
}

fn check_temperature(temperature: f64) -> Result<(), ClientError> {
    if !TEMPERATURE_RANGE.contains(&temperature) {
        return Err(ClientError::Validation(
            "Temperature must be between 0.0 and 2.0".to_string(),
        ));
    }
    Ok(())
}
