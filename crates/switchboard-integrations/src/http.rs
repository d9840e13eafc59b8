//! Authenticated REST client shared by every operation of one integration.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::IntegrationId;
use crate::error::{ConfigError, ToolError, ToolResult};

/// Future returned by a [`TokenSource`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + 'a>>;

/// Capability that yields a bearer token for each outgoing request.
///
/// Token exchange and refresh live behind this interface; the gateway only
/// asks for the current token.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> TokenFuture<'_>;
}

/// A fixed, pre-issued access token.
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: SecretString) -> Self {
        Self(token)
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> TokenFuture<'_> {
        Box::pin(async move { Ok(self.0.expose_secret().to_string()) })
    }
}

/// HTTP verb of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Patch,
    Delete,
}

impl Verb {
    fn method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A configured, authenticated client for one backend API.
pub struct RestClient {
    integration: IntegrationId,
    http: reqwest::Client,
    base_url: String,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl RestClient {
    /// Build a client that sends `headers` on every request. Header values
    /// are marked sensitive so they never show up in debug output.
    pub fn new(
        integration: IntegrationId,
        base_url: &str,
        headers: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        for (name, value) in headers {
            let mut value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidSetting {
                setting: "credential",
                reason: format!("{integration} credential is not a valid header value: {e}"),
            })?;
            value.set_sensitive(true);
            default_headers.insert(HeaderName::from_static(name), value);
        }

        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .map_err(|source| ConfigError::HttpClient { integration, source })?;

        Ok(Self {
            integration,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_source: None,
        })
    }

    /// Attach a bearer-token capability consulted before every request.
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and decode the response.
    ///
    /// 2xx bodies are returned as JSON (`null` when empty). Anything else
    /// becomes [`ToolError::Backend`] carrying the parsed body, or the raw
    /// text as a JSON string when it is not JSON.
    pub async fn send(
        &self,
        verb: Verb,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> ToolResult {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {:?} {}", self.integration, verb, url);

        let mut request = self.http.request(verb.method(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(tokens) = &self.token_source {
            let token = tokens.access_token().await?;
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = decode_body(&bytes);

        if status.is_success() {
            Ok(body)
        } else {
            Err(ToolError::Backend {
                status: status.as_u16(),
                body,
            })
        }
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
