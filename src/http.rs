//! HTTP plumbing shared by every request.
//!
//! This module builds the reqwest client and the fixed header set once per
//! [`DeepSeekClient`](crate::DeepSeekClient), and owns the single
//! response-normalization path used by every non-streaming call.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::client::ClientError;
use crate::model::Envelope;
use crate::options::{ClientOptions, SecretString};

/// Client identifier sent as `User-Agent`.
pub const CLIENT_ID: &str = concat!("deepseek-client-rust/", env!("CARGO_PKG_VERSION"));

/// Prefix of the `Authorization` header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Code reported when an error body is not valid JSON.
pub const PARSE_ERROR_CODE: &str = "parse_error";

const UNKNOWN_CODE: &str = "unknown";
const UNKNOWN_MESSAGE: &str = "Unknown error";

/// Build the header set attached to every request.
///
/// Extra headers are applied last and replace a base header of the same name.
pub fn build_headers(
    api_key: &SecretString,
    extra_headers: &Option<HashMap<String, String>>,
) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();

    let mut auth = HeaderValue::from_str(&format!("{}{}", BEARER_PREFIX, api_key.expose_secret()))
        .map_err(|_| {
            ClientError::Config("API key contains invalid header characters".to_string())
        })?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_ID));

    if let Some(extra) = extra_headers {
        for (key, value) in extra {
            let name = HeaderName::try_from(key.as_str())
                .map_err(|_| ClientError::Config(format!("Invalid header name: {}", key)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::Config(format!("Invalid value for header {}", key)))?;
            headers.insert(name, value);
        }
    }

    Ok(headers)
}

/// Build a configured HTTP client.
///
/// The timeout here only covers connecting; callers bound header and body
/// acquisition per request so that streaming bodies are never cut off.
pub fn build_http_client(
    options: &ClientOptions,
    headers: HeaderMap,
) -> Result<Client, ClientError> {
    let mut builder = Client::builder()
        .default_headers(headers)
        .connect_timeout(options.timeout);

    if let Some(proxy_url) = &options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("Invalid proxy URL {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Normalize a completed response into an envelope or an API error.
pub async fn read_envelope(response: reqwest::Response) -> Result<Envelope, ClientError> {
    let status = response.status();
    debug!(status = status.as_u16(), url = %response.url(), "received response");

    let body = response.text().await?;
    if !status.is_success() {
        return Err(api_error(status, &body));
    }

    Ok(serde_json::from_str(&body)?)
}

/// Shape a non-success response into [`ClientError::Api`].
///
/// `message` and `code` are read from the top level of a JSON body. A body
/// that is not JSON becomes the message, with [`PARSE_ERROR_CODE`] as code.
pub fn api_error(status: StatusCode, body: &str) -> ClientError {
    let (code, message) = match serde_json::from_str::<Value>(body) {
        Ok(json) => (
            field_or(&json, "code", UNKNOWN_CODE),
            field_or(&json, "message", UNKNOWN_MESSAGE),
        ),
        Err(_) => (PARSE_ERROR_CODE.to_string(), body.to_string()),
    };

    ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

fn field_or(json: &Value, key: &str, default: &str) -> String {
    match json.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::from("test_key")
    }

    #[test]
    fn test_build_headers() {
        let headers = build_headers(&key(), &None).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer test_key");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(headers[USER_AGENT].to_str().unwrap().starts_with("deepseek-client-rust/"));
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_build_headers_with_extra() {
        let mut extra = HashMap::new();
        extra.insert("X-Trace".to_string(), "abc".to_string());
        let headers = build_headers(&key(), &Some(extra)).unwrap();
        assert_eq!(headers["x-trace"], "abc");
        assert_eq!(headers.len(), 4);
    }

    #[test]
    fn test_build_headers_rejects_bad_key() {
        let err = build_headers(&SecretString::from("bad\nkey"), &None).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_build_http_client() {
        let options = ClientOptions::new();
        let client = build_http_client(&options, HeaderMap::new());
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let options = ClientOptions::new().with_proxy("http://proxy.example.com:8080");
        let client = build_http_client(&options, HeaderMap::new());
        assert!(client.is_ok());
    }

    #[test]
    fn test_api_error_from_json_body() {
        let body = r#"{"message": "Invalid request parameters", "code": "invalid_request"}"#;
        let err = api_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err.to_string(),
            "API Error 400 (invalid_request): Invalid request parameters"
        );
    }

    #[test]
    fn test_api_error_defaults_missing_fields() {
        let err = api_error(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail": "boom"}"#);
        assert_eq!(err.to_string(), "API Error 500 (unknown): Unknown error");
    }

    #[test]
    fn test_api_error_non_json_body() {
        let err = api_error(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>");
        assert_eq!(
            err.to_string(),
            "API Error 502 (parse_error): <html>Bad Gateway</html>"
        );
    }

    #[test]
    fn test_api_error_non_string_code() {
        let body = r#"{"message": "slow down", "code": 429}"#;
        let err = api_error(StatusCode::TOO_MANY_REQUESTS, body);
        match err {
            ClientError::Api { status, code, message } => {
                assert_eq!(status, 429);
                assert_eq!(code, "429");
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
