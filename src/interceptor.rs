//! Interceptor chains: ordered, individually removable request and response
//! transformations.
//!
//! Each chain is consulted in insertion order, every entry receiving the
//! previous entry's output. Chains are snapshotted by value at each pipeline
//! invocation, so registering or removing interceptors while requests are in
//! flight is allowed and never blocks I/O. Interceptors only ever see the
//! merged base config and the terminal response — never retried intermediate
//! failures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// A caller-registered transformation over requests or responses.
///
/// Implemented for free by any `Fn(T) -> T + Send + Sync` closure.
///
/// # Examples
///
/// ```
/// use dialpath::{Interceptor, RequestEnvelope};
/// use http::HeaderValue;
///
/// struct TraceHeader;
///
/// impl Interceptor<RequestEnvelope> for TraceHeader {
///     fn intercept(&self, mut envelope: RequestEnvelope) -> RequestEnvelope {
///         envelope
///             .headers
///             .insert("x-trace", HeaderValue::from_static("on"));
///         envelope
///     }
/// }
/// ```
pub trait Interceptor<T>: Send + Sync {
    /// Transforms the value, returning the (possibly replaced) result.
    fn intercept(&self, value: T) -> T;
}

impl<T, F> Interceptor<T> for F
where
    F: Fn(T) -> T + Send + Sync,
{
    fn intercept(&self, value: T) -> T {
        self(value)
    }
}

/// One registered interceptor with its addressable identity.
pub(crate) struct InterceptorEntry<T> {
    pub(crate) id: String,
    pub(crate) interceptor: Arc<dyn Interceptor<T>>,
}

impl<T> Clone for InterceptorEntry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

/// An insertion-ordered set of interceptors with unique ids.
pub(crate) struct InterceptorSet<T> {
    entries: RwLock<Vec<InterceptorEntry<T>>>,
    next_id: AtomicU64,
}

impl<T> InterceptorSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers an interceptor under a generated unique id and returns it.
    pub(crate) fn add(&self, interceptor: Arc<dyn Interceptor<T>>) -> String {
        let id = format!(
            "interceptor-{}",
            self.next_id.fetch_add(1, Ordering::Relaxed)
        );
        self.add_with_id(&id, interceptor);
        id
    }

    /// Registers an interceptor under a caller-controlled id. Re-using an id
    /// replaces the previous entry and moves it to the end of the chain.
    pub(crate) fn add_with_id(&self, id: &str, interceptor: Arc<dyn Interceptor<T>>) {
        let mut entries = self.write();
        entries.retain(|entry| entry.id != id);
        entries.push(InterceptorEntry {
            id: id.to_string(),
            interceptor,
        });
    }

    /// Removes the entry with the given id. Returns `true` iff one existed.
    pub(crate) fn remove(&self, id: &str) -> bool {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Empties the set.
    pub(crate) fn clear(&self) {
        self.write().clear();
    }

    /// A by-value copy of the chain, in execution order.
    pub(crate) fn snapshot(&self) -> Vec<InterceptorEntry<T>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<InterceptorEntry<T>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
