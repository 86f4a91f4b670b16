//! The route resolution engine: lazily materialized, cached handles that
//! mirror the caller's access pattern without a fixed endpoint schema.
//!
//! A dotted access chain is modeled as an explicit state machine —
//! `Client::route` enters a controller namespace, [`ControllerRoute::action`]
//! and [`ActionRoute::sub`] bind actions to any depth,
//! [`ControllerRoute::id`] binds a resource identifier, and the `send`
//! methods invoke. Every intermediate step is a side-effect-free, memoized
//! handle lookup; only invocation performs I/O.
//!
//! Handles returned for the same path are reference-equal (`Arc::ptr_eq`)
//! until the cache is cleared. Reserved segment names (`then`, `catch`,
//! `finally`, and `__`-prefixed) are never treated as actions: resolution
//! returns `None` instead of failing, so incidental probes cannot crash the
//! client.

use crate::cache::RouteCache;
use crate::client::Pipeline;
use crate::envelope::{CallOptions, RequestEnvelope};
use crate::method;
use crate::response::ApiResponse;
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

const RESERVED_SEGMENTS: &[&str] = &["then", "catch", "finally"];

/// Returns `true` for segment names that must never become actions, so that
/// a route handle is not mistaken for a thenable by surrounding code.
pub fn is_reserved_segment(name: &str) -> bool {
    name.starts_with("__") || RESERVED_SEGMENTS.contains(&name)
}

/// A handle bound to one controller namespace — the first path segment of a
/// dynamic access chain.
///
/// Dual-natured, like the dynamic original: traversable into action handlers
/// via [`action`](Self::action), and parameterizable into a resource handle
/// via [`id`](Self::id).
pub struct ControllerRoute {
    name: String,
    pipeline: Arc<Pipeline>,
    cache: Weak<RouteCache>,
}

impl ControllerRoute {
    pub(crate) fn new(name: String, pipeline: Arc<Pipeline>, cache: Weak<RouteCache>) -> Arc<Self> {
        Arc::new(Self {
            name,
            pipeline,
            cache,
        })
    }

    /// The controller name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The action-namespace view of this controller (the no-id call in the
    /// dynamic original), cached under the `action_<controller>` key.
    pub fn actions(&self) -> Arc<ActionNamespace> {
        let create = || ActionNamespace::new(format!("/{}", self.name), Arc::clone(&self.pipeline));
        match self.cache.upgrade() {
            Some(cache) => cache.actions_or_insert(&RouteCache::action_key(&self.name), create),
            // The owning cache is gone; the handle keeps working, it just
            // can no longer register.
            None => create(),
        }
    }

    /// Resolves an action handler bound to `/<controller>/<action>`.
    ///
    /// Returns `None` for [reserved segment names](is_reserved_segment).
    pub fn action(&self, name: &str) -> Option<Arc<ActionRoute>> {
        self.actions().get(name)
    }

    /// Resolves the parameterized route bound to `/<controller>/<id>`.
    ///
    /// The identifier is embedded immutably: a new id always produces a new
    /// handle under a new cache entry, never a mutated existing one.
    pub fn id(&self, id: impl ToString) -> Arc<ParamRoute> {
        let id = id.to_string();
        let create = || {
            ParamRoute::new(
                self.name.clone(),
                id.clone(),
                Arc::clone(&self.pipeline),
            )
        };
        match self.cache.upgrade() {
            Some(cache) => cache.param_or_insert(&RouteCache::param_key(&self.name, &id), create),
            None => create(),
        }
    }
}

/// Lazily materialized set of action handlers under one path prefix.
///
/// Handlers are minted on first access and memoized, so resolving the same
/// action twice yields the identical handle.
pub struct ActionNamespace {
    base_path: String,
    pipeline: Arc<Pipeline>,
    handlers: RwLock<HashMap<String, Arc<ActionRoute>>>,
}

impl ActionNamespace {
    pub(crate) fn new(base_path: String, pipeline: Arc<Pipeline>) -> Arc<Self> {
        Arc::new(Self {
            base_path,
            pipeline,
            handlers: RwLock::new(HashMap::new()),
        })
    }

    /// The path prefix all handlers in this namespace share.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Resolves (or mints) the handler for one action name. Reserved names
    /// resolve to `None`.
    pub fn get(&self, action: &str) -> Option<Arc<ActionRoute>> {
        if is_reserved_segment(action) {
            return None;
        }
        if let Some(existing) = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(action)
        {
            return Some(Arc::clone(existing));
        }
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let handler = handlers.entry(action.to_string()).or_insert_with(|| {
            ActionRoute::new(
                format!("{}/{}", self.base_path, action),
                action.to_string(),
                Arc::clone(&self.pipeline),
            )
        });
        Some(Arc::clone(handler))
    }
}

/// A request-issuing handler bound to one fully-qualified endpoint path.
///
/// Also a namespace: [`sub`](Self::sub) yields deeper handlers
/// (`/controller/action/subAction/...`) to unlimited depth, each level
/// memoized on its parent.
pub struct ActionRoute {
    endpoint: String,
    action_name: String,
    pipeline: Arc<Pipeline>,
    children: RwLock<HashMap<String, Arc<ActionRoute>>>,
}

impl ActionRoute {
    pub(crate) fn new(endpoint: String, action_name: String, pipeline: Arc<Pipeline>) -> Arc<Self> {
        Arc::new(Self {
            endpoint,
            action_name,
            pipeline,
            children: RwLock::new(HashMap::new()),
        })
    }

    /// The fully-qualified endpoint path, e.g. `/admin/users/ban`.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The deepest action name; this is what drives method inference.
    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Resolves a deeper sub-action handler bound to
    /// `<endpoint>/<name>`. Reserved names resolve to `None`.
    pub fn sub(&self, name: &str) -> Option<Arc<ActionRoute>> {
        if is_reserved_segment(name) {
            return None;
        }
        if let Some(existing) = self
            .children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Some(Arc::clone(existing));
        }
        let mut children = self
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let child = children.entry(name.to_string()).or_insert_with(|| {
            ActionRoute::new(
                format!("{}/{}", self.endpoint, name),
                name.to_string(),
                Arc::clone(&self.pipeline),
            )
        });
        Some(Arc::clone(child))
    }

    /// Invokes the endpoint with no payload.
    pub async fn invoke(&self) -> Result<ApiResponse> {
        self.send(CallOptions::new()).await
    }

    /// Invokes the endpoint with a JSON payload.
    pub async fn send_json(&self, payload: Value) -> Result<ApiResponse> {
        self.send(CallOptions::json(payload)).await
    }

    /// Invokes the endpoint with full call options.
    ///
    /// The reserved `"method"` payload key, if present, overrides inference
    /// and is stripped from the body.
    pub async fn send(&self, mut options: CallOptions) -> Result<ApiResponse> {
        let explicit = options
            .payload
            .as_mut()
            .and_then(method::take_explicit_method);
        let verb = method::resolve(&self.action_name, self.pipeline.method_rules(), explicit);
        let envelope = RequestEnvelope::new(verb, self.endpoint.clone(), options);
        self.pipeline.execute(envelope).await
    }
}

/// A handle bound to a specific resource identifier: `/<controller>/<id>`.
///
/// Directly invokable as the "get-or-update" action on the bare resource —
/// no payload resolves like a `get` action, a non-empty payload like an
/// `update` action, and an explicit `"method"` payload key overrides both —
/// and traversable into `/<controller>/<id>/<action>` handlers.
pub struct ParamRoute {
    controller: String,
    id: String,
    endpoint: String,
    pipeline: Arc<Pipeline>,
    handlers: RwLock<HashMap<String, Arc<ActionRoute>>>,
}

impl ParamRoute {
    pub(crate) fn new(controller: String, id: String, pipeline: Arc<Pipeline>) -> Arc<Self> {
        let endpoint = format!("/{controller}/{id}");
        Arc::new(Self {
            controller,
            id,
            endpoint,
            pipeline,
            handlers: RwLock::new(HashMap::new()),
        })
    }

    /// The controller this resource belongs to.
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// The embedded resource identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The endpoint prefix, e.g. `/users/123`.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resolves an action handler bound to `/<controller>/<id>/<action>`.
    /// Reserved names resolve to `None`.
    pub fn action(&self, name: &str) -> Option<Arc<ActionRoute>> {
        if is_reserved_segment(name) {
            return None;
        }
        if let Some(existing) = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Some(Arc::clone(existing));
        }
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let handler = handlers.entry(name.to_string()).or_insert_with(|| {
            ActionRoute::new(
                format!("{}/{}", self.endpoint, name),
                name.to_string(),
                Arc::clone(&self.pipeline),
            )
        });
        Some(Arc::clone(handler))
    }

    /// Invokes the bare resource with no payload (`GET` unless overridden by
    /// rules or an explicit method).
    pub async fn invoke(&self) -> Result<ApiResponse> {
        self.send(CallOptions::new()).await
    }

    /// Invokes the bare resource with a JSON payload (`PUT` semantics unless
    /// overridden).
    pub async fn send_json(&self, payload: Value) -> Result<ApiResponse> {
        self.send(CallOptions::json(payload)).await
    }

    /// Invokes the bare resource with full call options.
    pub async fn send(&self, mut options: CallOptions) -> Result<ApiResponse> {
        let explicit = options
            .payload
            .as_mut()
            .and_then(method::take_explicit_method);
        let implied_action = if options.payload.as_ref().is_some_and(payload_is_non_empty) {
            "update"
        } else {
            "get"
        };
        let verb = method::resolve(implied_action, self.pipeline.method_rules(), explicit);
        let envelope = RequestEnvelope::new(verb, self.endpoint.clone(), options);
        self.pipeline.execute(envelope).await
    }
}

fn payload_is_non_empty(payload: &Value) -> bool {
    match payload {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Client;

    fn client() -> Client {
        Client::builder()
            .base_url("http://localhost:9")
            .expect("valid url")
            .build()
            .expect("client builds")
    }

    #[test]
    fn reserved_segments_resolve_to_none() {
        let client = client();
        let users = client.route("users");

        for name in ["then", "catch", "finally", "__proto__", "__anything"] {
            assert!(users.action(name).is_none(), "{name} must not resolve");
            assert!(users.id(1).action(name).is_none());
        }
        let handler = users.action("getProfile").unwrap();
        assert!(handler.sub("then").is_none());
    }

    #[test]
    fn endpoints_mirror_the_access_chain() {
        let client = client();

        let users = client.route("users");
        assert_eq!(users.name(), "users");
        assert_eq!(users.actions().base_path(), "/users");

        let user = users.id(123);
        assert_eq!(user.controller(), "users");
        assert_eq!(user.endpoint(), "/users/123");

        let ban = client
            .route("admin")
            .action("users")
            .unwrap()
            .sub("ban")
            .unwrap();
        assert_eq!(ban.endpoint(), "/admin/users/ban");
        assert_eq!(ban.action_name(), "ban");

        let follow = client.route("users").id(123).action("follow").unwrap();
        assert_eq!(follow.endpoint(), "/users/123/follow");

        let deep = ban.sub("appeal").unwrap().sub("review").unwrap();
        assert_eq!(deep.endpoint(), "/admin/users/ban/appeal/review");
        assert_eq!(deep.action_name(), "review");
    }

    #[test]
    fn resolution_is_idempotent_and_reference_stable() {
        let client = client();

        let first = client.route("users").action("getProfile").unwrap();
        let second = client.route("users").action("getProfile").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let param_first = client.route("users").id(123);
        let param_second = client.route("users").id(123);
        assert!(Arc::ptr_eq(&param_first, &param_second));

        // A different id is a different handle, never a mutated one.
        let other = client.route("users").id(124);
        assert!(!Arc::ptr_eq(&param_first, &other));
        assert_eq!(param_first.id(), "123");
    }

    #[test]
    fn cache_counts_follow_resolution() {
        let client = client();
        assert_eq!(client.cache_stats().routes, 0);

        client.route("users").action("getProfile").unwrap();
        let stats = client.cache_stats();
        assert_eq!(stats.routes, 1);
        assert_eq!(stats.actions, 1);
        assert_eq!(stats.parameterized, 0);

        // Re-resolving the same path adds nothing.
        client.route("users").action("getProfile").unwrap();
        assert_eq!(client.cache_stats(), stats);

        client.route("users").id(7);
        assert_eq!(client.cache_stats().parameterized, 1);
    }

    #[test]
    fn clearing_the_cache_mints_fresh_handles() {
        let client = client();
        let before = client.route("users").action("getProfile").unwrap();

        client.clear_route_cache();
        let stats = client.cache_stats();
        assert_eq!(
            (stats.routes, stats.actions, stats.parameterized),
            (0, 0, 0)
        );

        let after = client.route("users").action("getProfile").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }
}
