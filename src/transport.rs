//! The abstract transport contract and its default `reqwest` implementation.
//!
//! The pipeline never talks to the network directly: it hands a
//! [`TransportRequest`] to a [`Transport`] and gets back a status, headers,
//! and a body. A non-2xx status is a valid response; only network failures,
//! timeouts, and aborts are errors. Swapping the transport (e.g. for tests)
//! is a builder option.

use crate::{Error, Result};
use http::{HeaderMap, Method, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// Boxed future alias used at the transport seam.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One fully assembled attempt, ready to go on the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: Method,
    /// The encoded URL, query string included.
    pub url: Url,
    /// All headers, defaults already merged in.
    pub headers: HeaderMap,
    /// JSON body, if any.
    pub body: Option<serde_json::Value>,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
}

/// The raw result of one attempt, whatever the status.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body as text.
    pub body: String,
}

/// Abstract HTTP send contract consumed by the execution pipeline.
pub trait Transport: Send + Sync {
    /// Performs one attempt.
    ///
    /// Implementations must resolve non-2xx statuses as `Ok` responses and
    /// reserve `Err` for network-level failures, classified per
    /// [`Error::from_reqwest`] semantics (network / timeout / parse).
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<TransportResponse>>;
}

/// The default transport, backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a fresh connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing `reqwest` client (custom TLS, proxies, pools).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<TransportResponse>> {
        let client = self.client.clone();
        Box::pin(async move {
            let mut builder = client
                .request(request.method, request.url)
                .headers(request.headers);
            if let Some(timeout) = request.timeout {
                builder = builder.timeout(timeout);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(Error::from_reqwest)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.text().await.map_err(Error::from_reqwest)?;

            Ok(TransportResponse {
                status,
                headers,
                body,
            })
        })
    }
}
