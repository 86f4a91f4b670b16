//! Per-call request types: the caller-facing [`CallOptions`] and the fully
//! merged [`RequestEnvelope`] the pipeline executes.

use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Options a caller attaches to one route invocation.
///
/// Everything is optional; defaults come from the client at merge time.
///
/// # Examples
///
/// ```
/// use dialpath::CallOptions;
/// use serde_json::json;
/// use std::time::Duration;
///
/// let options = CallOptions::new()
///     .with_payload(json!({"reason": "spam"}))
///     .with_query_param("notify", "true")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// JSON request body. A reserved `"method"` key, if present, overrides
    /// method inference and is stripped before serialization.
    pub payload: Option<Value>,
    /// Query parameters. `None` values are filtered out at URL assembly.
    pub query: Vec<(String, Option<String>)>,
    /// Extra headers for this call, merged over the client defaults.
    pub headers: HeaderMap,
    /// Per-attempt timeout; falls back to the client default.
    pub timeout: Option<Duration>,
    /// Caller-supplied cancellation. An aborted attempt is never retried.
    pub cancel: Option<CancellationToken>,
}

impl CallOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a payload-only call.
    pub fn json(payload: Value) -> Self {
        Self::new().with_payload(payload)
    }

    /// Sets the JSON payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Appends a query parameter.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), Some(value.into())));
        self
    }

    /// Appends a query parameter that may be absent. `None` values are
    /// dropped at URL assembly, so callers can thread optional fields
    /// through without branching.
    pub fn with_optional_query_param(
        mut self,
        key: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        self.query.push((key.into(), value));
        self
    }

    /// Adds a header to the call.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// A fully merged, ready-to-execute request.
///
/// Created per call by the route handles, threaded through the request
/// interceptor chain, and consumed by the execution pipeline. Never shared
/// or reused across calls.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// The resolved HTTP method.
    pub method: Method,
    /// The endpoint path relative to the base URL, e.g. `/admin/users/ban`.
    pub endpoint: String,
    /// JSON body, already stripped of the reserved `"method"` key.
    pub payload: Option<Value>,
    /// Query parameters; `None` values are filtered out at URL assembly.
    pub query: Vec<(String, Option<String>)>,
    /// Headers for this request; client defaults are merged in by the
    /// pipeline.
    pub headers: HeaderMap,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Cancellation token for the whole call.
    pub cancel: Option<CancellationToken>,
}

impl RequestEnvelope {
    pub(crate) fn new(method: Method, endpoint: impl Into<String>, options: CallOptions) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            payload: options.payload,
            query: options.query,
            headers: options.headers,
            timeout: options.timeout,
            cancel: options.cancel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_accumulate_query_params_in_order() {
        let options = CallOptions::new()
            .with_query_param("page", "1")
            .with_optional_query_param("filter", None)
            .with_query_param("limit", "10");

        assert_eq!(
            options.query,
            vec![
                ("page".to_string(), Some("1".to_string())),
                ("filter".to_string(), None),
                ("limit".to_string(), Some("10".to_string())),
            ]
        );
    }

    #[test]
    fn invalid_headers_are_configuration_errors() {
        let result = CallOptions::new().with_header("bad header", "v");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn envelope_takes_ownership_of_the_options() {
        let envelope = RequestEnvelope::new(
            Method::POST,
            "/users/ban",
            CallOptions::json(json!({"id": 1})),
        );
        assert_eq!(envelope.endpoint, "/users/ban");
        assert_eq!(envelope.payload, Some(json!({"id": 1})));
        assert!(envelope.timeout.is_none());
    }
}
