//! The dynamic client facade and the request execution pipeline.
//!
//! [`Client`] is the entry point: `route()` enters a controller namespace
//! and hands back cached, invokable handles. Every invocation flows through
//! one shared pipeline — merge defaults → request interceptors → attempt
//! loop with retry → response normalization → response interceptors.

use crate::cache::{CacheStats, RouteCache};
use crate::case::CaseStyle;
use crate::envelope::{CallOptions, RequestEnvelope};
use crate::interceptor::{Interceptor, InterceptorSet};
use crate::method::MethodRules;
use crate::response::ApiResponse;
use crate::retry::{RetryOnTransport, RetryPredicate, RetryStrategy};
use crate::route::ControllerRoute;
use crate::transport::{HttpTransport, Transport, TransportRequest, TransportResponse};
use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// A dynamic-routing HTTP client.
///
/// The client is cheap to clone and designed to be reused: it owns one
/// route cache, one interceptor manager, and one connection pool. Teardown
/// is explicit — call [`clear_route_cache`](Self::clear_route_cache) (and
/// the interceptor `clear_*` methods) when discarding a client to release
/// retained handles and closures.
///
/// # Examples
///
/// ```no_run
/// use dialpath::{CallOptions, Client, RetryStrategy};
/// use serde_json::json;
/// use std::time::Duration;
///
/// # async fn example() -> dialpath::Result<()> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .timeout(Duration::from_secs(30))
///     .retry_strategy(RetryStrategy::exponential(Duration::from_millis(100), 3))
///     .build()?;
///
/// // POST /admin/users/ban — "ban" matches no semantic keyword, so the
/// // default method applies.
/// let banned = client
///     .route("admin")
///     .action("users")
///     .expect("not reserved")
///     .sub("ban")
///     .expect("not reserved")
///     .send_json(json!({"userId": 456, "reason": "spam"}))
///     .await?;
/// assert!(banned.success);
///
/// // GET /users/123 — a bare parameterized route with no payload.
/// let user = client.route("users").id(123).invoke().await?;
/// println!("{:?}", user.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    pipeline: Arc<Pipeline>,
    cache: Arc<RouteCache>,
}

impl Client {
    /// Creates a new [`ClientBuilder`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Enters a controller namespace, returning its cached route handle.
    ///
    /// Repeated calls with the same name return the identical handle until
    /// the cache is cleared.
    pub fn route(&self, name: &str) -> Arc<ControllerRoute> {
        self.cache.controller_or_insert(name, || {
            ControllerRoute::new(
                name.to_string(),
                Arc::clone(&self.pipeline),
                Arc::downgrade(&self.cache),
            )
        })
    }

    /// Generic invoke-by-path entry point: `"admin/users/ban"` resolves the
    /// same handles as the fluent chain and invokes the deepest one.
    ///
    /// All segments after the first are treated as action segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for paths with fewer than two
    /// segments or containing reserved segment names, plus anything the
    /// invocation itself returns.
    pub async fn invoke_path(&self, path: &str, options: CallOptions) -> Result<ApiResponse> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (controller, actions) = match segments.split_first() {
            Some((controller, actions)) if !actions.is_empty() => (*controller, actions),
            _ => {
                return Err(Error::Configuration(format!(
                    "route path needs a controller and at least one action: {path:?}"
                )))
            }
        };

        let route = self.route(controller);
        let mut handler = route.action(actions[0]).ok_or_else(|| {
            Error::Configuration(format!("reserved route segment: {:?}", actions[0]))
        })?;
        for segment in &actions[1..] {
            handler = handler.sub(segment).ok_or_else(|| {
                Error::Configuration(format!("reserved route segment: {segment:?}"))
            })?;
        }
        handler.send(options).await
    }

    /// Snapshot of the route cache table sizes.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Empties the route cache. Previously resolved paths produce fresh
    /// handles on next access.
    pub fn clear_route_cache(&self) {
        self.cache.clear();
    }

    /// Registers a request interceptor; returns its generated id.
    pub fn add_request_interceptor<I>(&self, interceptor: I) -> String
    where
        I: Interceptor<RequestEnvelope> + 'static,
    {
        self.pipeline.request_interceptors.add(Arc::new(interceptor))
    }

    /// Registers a request interceptor under a caller-controlled id,
    /// replacing any previous entry with that id.
    pub fn add_request_interceptor_with_id<I>(&self, id: &str, interceptor: I)
    where
        I: Interceptor<RequestEnvelope> + 'static,
    {
        self.pipeline
            .request_interceptors
            .add_with_id(id, Arc::new(interceptor));
    }

    /// Removes a request interceptor. Returns `true` iff one existed.
    pub fn remove_request_interceptor(&self, id: &str) -> bool {
        self.pipeline.request_interceptors.remove(id)
    }

    /// Removes all request interceptors.
    pub fn clear_request_interceptors(&self) {
        self.pipeline.request_interceptors.clear();
    }

    /// Registers a response interceptor; returns its generated id.
    pub fn add_response_interceptor<I>(&self, interceptor: I) -> String
    where
        I: Interceptor<ApiResponse> + 'static,
    {
        self.pipeline
            .response_interceptors
            .add(Arc::new(interceptor))
    }

    /// Registers a response interceptor under a caller-controlled id,
    /// replacing any previous entry with that id.
    pub fn add_response_interceptor_with_id<I>(&self, id: &str, interceptor: I)
    where
        I: Interceptor<ApiResponse> + 'static,
    {
        self.pipeline
            .response_interceptors
            .add_with_id(id, Arc::new(interceptor));
    }

    /// Removes a response interceptor. Returns `true` iff one existed.
    pub fn remove_response_interceptor(&self, id: &str) -> bool {
        self.pipeline.response_interceptors.remove(id)
    }

    /// Removes all response interceptors.
    pub fn clear_response_interceptors(&self) {
        self.pipeline.response_interceptors.clear();
    }
}

/// The shared request execution pipeline.
///
/// Route handles hold this strongly and the route cache weakly, so there are
/// no reference cycles between handles and the client state.
pub(crate) struct Pipeline {
    transport: Arc<dyn Transport>,
    base_url: Url,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    retry_strategy: RetryStrategy,
    retry_predicate: Box<dyn RetryPredicate>,
    method_rules: MethodRules,
    case_style: CaseStyle,
    pub(crate) request_interceptors: InterceptorSet<RequestEnvelope>,
    pub(crate) response_interceptors: InterceptorSet<ApiResponse>,
}

impl Pipeline {
    pub(crate) fn method_rules(&self) -> &MethodRules {
        &self.method_rules
    }

    /// Runs one envelope through interceptors, the retry loop, and response
    /// normalization. Exactly one transport call per attempt; no transport
    /// call happens while interceptors run.
    pub(crate) async fn execute(&self, envelope: RequestEnvelope) -> Result<ApiResponse> {
        let mut envelope = envelope;
        self.merge_defaults(&mut envelope);
        for entry in self.request_interceptors.snapshot() {
            envelope = entry.interceptor.intercept(envelope);
            // An interceptor may have dropped merged fields; restore them.
            self.merge_defaults(&mut envelope);
        }

        let start = Instant::now();
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            tracing::debug!(
                method = %envelope.method,
                endpoint = %envelope.endpoint,
                attempt,
                "executing request"
            );

            match self.attempt(&envelope).await {
                Ok(raw) => {
                    let latency = start.elapsed();
                    tracing::info!(
                        status = raw.status.as_u16(),
                        latency_ms = latency.as_millis() as u64,
                        attempts = attempt,
                        "received response"
                    );
                    let mut response =
                        ApiResponse::normalize(raw.status, raw.headers, raw.body, latency, attempt);
                    for entry in self.response_interceptors.snapshot() {
                        response = entry.interceptor.intercept(response);
                    }
                    return Ok(response);
                }
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        kind = error.kind(),
                        attempt,
                        method = %envelope.method,
                        endpoint = %envelope.endpoint,
                        "request attempt failed"
                    );

                    if !self.retry_predicate.should_retry(&error, attempt) {
                        return Err(error);
                    }

                    match self.retry_strategy.delay_for_attempt(attempt - 1) {
                        Some(delay) => {
                            tracing::info!(
                                delay_ms = delay.as_millis() as u64,
                                attempt,
                                "retrying after backoff"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        // Wrap only when at least one retry actually
                        // happened; a no-retry failure surfaces as-is.
                        None if attempt > 1 => {
                            return Err(Error::RetriesExhausted {
                                attempts: attempt,
                                last_error: Box::new(error),
                            });
                        }
                        None => return Err(error),
                    }
                }
            }
        }
    }

    fn merge_defaults(&self, envelope: &mut RequestEnvelope) {
        for (name, value) in &self.default_headers {
            if !envelope.headers.contains_key(name) {
                envelope.headers.insert(name.clone(), value.clone());
            }
        }
        if envelope.timeout.is_none() {
            envelope.timeout = self.timeout;
        }
    }

    /// One transport attempt, guarded by the caller's cancellation token
    /// when present. The per-attempt timeout rides inside the transport
    /// request, so every retry gets a fresh window.
    async fn attempt(&self, envelope: &RequestEnvelope) -> Result<TransportResponse> {
        let request = TransportRequest {
            method: envelope.method.clone(),
            url: self.build_url(envelope)?,
            headers: envelope.headers.clone(),
            body: envelope.payload.clone(),
            timeout: envelope.timeout,
        };

        let send = self.transport.send(request);
        match &envelope.cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => Err(Error::Aborted),
                    result = send => result,
                }
            }
            None => send.await,
        }
    }

    /// Assembles the encoded URL: base, case-converted path segments, and
    /// query parameters with `None` values filtered out.
    fn build_url(&self, envelope: &RequestEnvelope) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Configuration("base URL cannot be a base".to_string()))?;
            segments.pop_if_empty();
            for segment in envelope.endpoint.split('/').filter(|s| !s.is_empty()) {
                segments.push(&self.case_style.apply(segment));
            }
        }
        for (key, value) in &envelope.query {
            if let Some(value) = value {
                url.query_pairs_mut()
                    .append_pair(&self.case_style.apply(key), value);
            }
        }
        Ok(url)
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use dialpath::{CaseStyle, ClientBuilder, RetryStrategy};
/// use http::Method;
/// use std::time::Duration;
///
/// # fn example() -> dialpath::Result<()> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.example.com")?
///     .timeout(Duration::from_secs(30))
///     .retry_strategy(RetryStrategy::exponential(Duration::from_millis(100), 3))
///     .default_header("User-Agent", "my-app/1.0")?
///     .default_method(Method::POST)
///     .method_rule("verify*", Method::POST)
///     .case_style(CaseStyle::Snake)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    retry_strategy: RetryStrategy,
    retry_predicate: Option<Box<dyn RetryPredicate>>,
    method_rules: MethodRules,
    case_style: CaseStyle,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Creates a builder with default settings: no retries, POST as the
    /// fallback method, no case conversion.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            timeout: None,
            retry_strategy: RetryStrategy::None,
            retry_predicate: None,
            method_rules: MethodRules::new(),
            case_style: CaseStyle::Preserve,
            transport: None,
        }
    }

    /// Sets the base URL for all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a header included in every request (call headers win on
    /// conflict).
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the default per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry strategy for transport-level failures.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Sets a custom retry predicate. Defaults to retrying transport-level
    /// failures only.
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.retry_predicate = Some(predicate);
        self
    }

    /// Sets the fallback method used when inference finds no signal.
    pub fn default_method(mut self, method: Method) -> Self {
        self.method_rules.default_method = method;
        self
    }

    /// Appends a method inference rule; see [`MethodRules`] for pattern
    /// syntax.
    pub fn method_rule(mut self, pattern: impl Into<String>, method: Method) -> Self {
        self.method_rules = self.method_rules.rule(pattern, method);
        self
    }

    /// Replaces the whole method rule set.
    pub fn method_rules(mut self, rules: MethodRules) -> Self {
        self.method_rules = rules;
        self
    }

    /// Sets the wire case convention for path segments and query keys.
    pub fn case_style(mut self, style: CaseStyle) -> Self {
        self.case_style = style;
        self
    }

    /// Replaces the transport (e.g. with a mock in tests, or a tuned
    /// [`HttpTransport`]).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the configured [`Client`].
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Configuration("Base URL is required".to_string()))?;

        let pipeline = Arc::new(Pipeline {
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(HttpTransport::new())),
            base_url,
            default_headers: self.default_headers,
            timeout: self.timeout,
            retry_strategy: self.retry_strategy,
            retry_predicate: self
                .retry_predicate
                .unwrap_or_else(|| Box::new(RetryOnTransport)),
            method_rules: self.method_rules,
            case_style: self.case_style,
            request_interceptors: InterceptorSet::new(),
            response_interceptors: InterceptorSet::new(),
        });

        Ok(Client {
            pipeline,
            cache: Arc::new(RouteCache::new()),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
