//! Backend forwarding.
//!
//! Each tool is forwarded as `POST {base_url}/mcp/{tool}` with the caller's raw JSON payload.
//! The backend's body is parsed as JSON whatever its HTTP status; anything else (transport
//! failure, timeout, non-JSON body) is `BackendUnavailable`.

use crate::error::{BridgeError, Result};
use crate::registry::ToolId;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Fixed path prefix of every backend route.
const ROUTE_PREFIX: &str = "mcp";

/// Something that can execute a tool on behalf of the dispatcher.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Forward `payload` to the backend route of `tool` and return the parsed response body.
    async fn forward(&self, tool: ToolId, payload: &Value) -> Result<Value>;
}

/// Build the backend route for a tool.
///
/// This is the only place route URLs are constructed.
#[must_use]
pub fn route_url(base_url: &str, tool: ToolId) -> String {
    format!(
        "{}/{ROUTE_PREFIX}/{}",
        base_url.trim_end_matches('/'),
        tool.name()
    )
}

/// Validate a backend base URL (absolute `http(s)` URL with a host).
///
/// # Errors
///
/// Returns a `Config` error if the URL cannot be parsed, uses another scheme, or has no host.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| BridgeError::Config(format!("Invalid backend base URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(BridgeError::Config(format!(
                "Invalid backend base URL '{raw}': unsupported scheme '{other}'"
            )));
        }
    }
    if url.host_str().is_none() {
        return Err(BridgeError::Config(format!(
            "Invalid backend base URL '{raw}': missing host"
        )));
    }
    Ok(url)
}

pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    /// Build an HTTP backend.
    ///
    /// `timeout` of `None` (or zero) leaves the client's default behavior in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        parse_base_url(base_url)?;

        let mut builder = Client::builder();
        if let Some(t) = timeout.filter(|t| *t > Duration::from_millis(0)) {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| BridgeError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn forward(&self, tool: ToolId, payload: &Value) -> Result<Value> {
        let url = route_url(&self.base_url, tool);

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| BridgeError::BackendUnavailable(sanitize_reqwest_error(&e)))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(tool = %tool, status = %status, "backend returned non-success status");
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BridgeError::BackendUnavailable(sanitize_reqwest_error(&e)))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            BridgeError::BackendUnavailable(format!(
                "invalid json response body at {} (status {status}): {e}",
                redact_url_str(&url)
            ))
        })
    }
}

fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

fn redact_url_str(raw: &str) -> String {
    Url::parse(raw).map_or_else(|_| raw.to_string(), |u| redact_url(&u))
}

/// Render a reqwest error with its source chain, credentials stripped from the URL.
fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
