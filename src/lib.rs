//! # Dialpath - a dynamic-routing HTTP client library
//!
//! Dialpath lets callers address arbitrary REST-like endpoints through
//! chained route handles instead of hand-written URLs. The HTTP verb is
//! inferred from the action name, route handles are cached so repeated
//! access is referentially stable, and every invocation runs through a
//! shared interceptor/retry pipeline.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dialpath::{CallOptions, Client, RetryStrategy};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> dialpath::Result<()> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")?
//!         .timeout(Duration::from_secs(30))
//!         .retry_strategy(RetryStrategy::exponential(Duration::from_millis(100), 3))
//!         .build()?;
//!
//!     // GET /users/getProfile?id=123 — "getProfile" starts with "get".
//!     let profile = client
//!         .route("users")
//!         .action("getProfile")
//!         .expect("not a reserved name")
//!         .send(CallOptions::new().with_query_param("id", "123"))
//!         .await?;
//!     println!("success: {}, data: {:?}", profile.success, profile.data);
//!
//!     // POST /admin/users/ban — no keyword matches, so the default applies.
//!     client
//!         .route("admin")
//!         .action("users")
//!         .expect("not a reserved name")
//!         .sub("ban")
//!         .expect("not a reserved name")
//!         .send_json(json!({"userId": 456, "reason": "spam"}))
//!         .await?;
//!
//!     // Parameterized routes: GET /users/123, PUT /users/123,
//!     // POST /users/123/follow.
//!     let user = client.route("users").id(123);
//!     user.invoke().await?;
//!     user.send_json(json!({"name": "X"})).await?;
//!     user.action("follow")
//!         .expect("not a reserved name")
//!         .send_json(json!({"notify": true}))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## How requests are shaped
//!
//! - **Routing** - `route("users")` enters a controller namespace;
//!   `.action(..)`/`.sub(..)` bind actions to any depth; `.id(..)` binds a
//!   resource identifier. Handles are cached: resolving the same path twice
//!   returns the identical `Arc` until [`Client::clear_route_cache`].
//! - **Method inference** - explicit `"method"` payload key, then direct
//!   method names, then configured rules (`verify*`, `*Report`), then
//!   semantic keywords (`getX` → GET, `createX` → POST, `updateX` → PUT,
//!   `removeX` → DELETE, `toggleX` → PATCH), then the default. See
//!   [`method::resolve`].
//! - **Pipeline** - request interceptors → retry with exponential backoff
//!   and jitter → transport → response normalization → response
//!   interceptors.
//!
//! ## Errors vs. unsuccessful responses
//!
//! Only transport-level failures (network, timeout, abort) are [`Error`]s,
//! and only network errors and timeouts are retried. Non-2xx statuses and
//! unparseable bodies come back as an [`ApiResponse`] with
//! `success: false` — they are never retried and never thrown:
//!
//! ```no_run
//! # async fn example() -> dialpath::Result<()> {
//! # let client = dialpath::Client::builder().base_url("https://api.example.com")?.build()?;
//! match client.route("users").id(999).invoke().await {
//!     Ok(response) if response.success => println!("{:?}", response.data),
//!     Ok(response) => println!("API said no: {:?}", response.error),
//!     Err(e) => eprintln!("transport failure ({}): {}", e.kind(), e),
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod case;
mod client;
mod envelope;
mod error;
mod interceptor;
pub mod method;
mod response;
pub mod retry;
mod route;
pub mod transport;

pub use cache::CacheStats;
pub use case::CaseStyle;
pub use client::{Client, ClientBuilder};
pub use envelope::{CallOptions, RequestEnvelope};
pub use error::{Error, Result};
pub use interceptor::Interceptor;
pub use method::MethodRules;
pub use response::{ApiError, ApiResponse, PARSE_FAILURE_MESSAGE};
pub use retry::{RetryPredicate, RetryStrategy};
pub use route::{
    is_reserved_segment, ActionNamespace, ActionRoute, ControllerRoute, ParamRoute,
};
pub use transport::{HttpTransport, Transport};
