//! Outbound HTTP seam
//!
//! Providers never touch `reqwest` directly; they describe a request as an
//! `OutboundRequest` and hand it to a `Transport`. Production uses
//! `ReqwestTransport`, tests script responses per URL.

use reqwest::Method;
use tracing::{debug, instrument};

use crate::BoxFuture;

/// A request to a provider endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status and body of a provider response. Bodies are small text documents
/// (form-encoded or JSON), so they are read eagerly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The request never produced a response (connect, TLS, timeout, cancel).
#[derive(Debug, thiserror::Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

/// Executes outbound requests on behalf of providers.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: OutboundRequest,
    ) -> BoxFuture<'_, std::result::Result<TransportResponse, TransportError>>;
}

/// `reqwest`-backed transport. Connect/read timeouts belong to the client
/// passed in.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn execute(
        &self,
        request: OutboundRequest,
    ) -> BoxFuture<'_, std::result::Result<TransportResponse, TransportError>> {
        Box::pin(send(&self.client, request))
    }
}

#[instrument(skip_all, fields(method = %request.method, host = host_of(&request.url)))]
async fn send(
    client: &reqwest::Client,
    request: OutboundRequest,
) -> std::result::Result<TransportResponse, TransportError> {
    let mut builder = client.request(request.method, &request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = builder
        .send()
        .await
        .map_err(|e| TransportError(e.to_string()))?;
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| TransportError(format!("failed to read body: {e}")))?;

    debug!(status, bytes = body.len(), "provider responded");
    Ok(TransportResponse { status, body })
}

/// Host portion of a URL for log fields; query strings may carry secrets.
fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', '?']).next().unwrap_or(rest)
}
