//! The route cache: three memoization tables keyed by path-derived strings.
//!
//! The cache is what makes repeated access to the same dotted path cheap and
//! referentially stable — resolving a path twice returns the identical
//! (`Arc::ptr_eq`) handle. It is owned by one client instance, read-mostly
//! after warm-up, and released explicitly via [`RouteCache::clear`] at
//! teardown.

use crate::route::{ActionNamespace, ControllerRoute, ParamRoute};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Read-only snapshot of the three cache tables' sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Bare controller routes.
    pub routes: usize,
    /// Action namespaces (controller with no id).
    pub actions: usize,
    /// Parameterized (controller, id) routes.
    pub parameterized: usize,
}

/// Memoization table for route handles.
///
/// Keys are deterministic string concatenations: the controller name itself,
/// `action_<controller>`, and `param_<controller>_<id>`. A controller named
/// `x_y` with id `z` therefore shares a key with a controller `x` carrying
/// id `y_z`; this is a known, accepted limitation of the key scheme rather
/// than something the cache guards against.
pub(crate) struct RouteCache {
    controllers: RwLock<HashMap<String, Arc<ControllerRoute>>>,
    actions: RwLock<HashMap<String, Arc<ActionNamespace>>>,
    parameterized: RwLock<HashMap<String, Arc<ParamRoute>>>,
}

impl RouteCache {
    pub(crate) fn new() -> Self {
        Self {
            controllers: RwLock::new(HashMap::new()),
            actions: RwLock::new(HashMap::new()),
            parameterized: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn action_key(controller: &str) -> String {
        format!("action_{controller}")
    }

    pub(crate) fn param_key(controller: &str, id: &str) -> String {
        format!("param_{controller}_{id}")
    }

    pub(crate) fn controller_or_insert(
        &self,
        name: &str,
        create: impl FnOnce() -> Arc<ControllerRoute>,
    ) -> Arc<ControllerRoute> {
        get_or_insert(&self.controllers, name, create)
    }

    pub(crate) fn actions_or_insert(
        &self,
        key: &str,
        create: impl FnOnce() -> Arc<ActionNamespace>,
    ) -> Arc<ActionNamespace> {
        get_or_insert(&self.actions, key, create)
    }

    pub(crate) fn param_or_insert(
        &self,
        key: &str,
        create: impl FnOnce() -> Arc<ParamRoute>,
    ) -> Arc<ParamRoute> {
        get_or_insert(&self.parameterized, key, create)
    }

    /// Empties all three tables atomically: no lookup can observe a
    /// partially cleared cache.
    pub(crate) fn clear(&self) {
        let mut controllers = write(&self.controllers);
        let mut actions = write(&self.actions);
        let mut parameterized = write(&self.parameterized);
        tracing::debug!(
            routes = controllers.len(),
            actions = actions.len(),
            parameterized = parameterized.len(),
            "clearing route cache"
        );
        controllers.clear();
        actions.clear();
        parameterized.clear();
    }

    /// Sizes of the three tables at call time.
    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            routes: read(&self.controllers).len(),
            actions: read(&self.actions).len(),
            parameterized: read(&self.parameterized).len(),
        }
    }
}

fn get_or_insert<V>(
    table: &RwLock<HashMap<String, Arc<V>>>,
    key: &str,
    create: impl FnOnce() -> Arc<V>,
) -> Arc<V> {
    if let Some(existing) = read(table).get(key) {
        return Arc::clone(existing);
    }
    let mut table = write(table);
    Arc::clone(table.entry(key.to_string()).or_insert_with(create))
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic_concatenations() {
        assert_eq!(RouteCache::action_key("users"), "action_users");
        assert_eq!(RouteCache::param_key("users", "123"), "param_users_123");
    }

    #[test]
    fn key_scheme_collision_is_a_known_limitation() {
        // Different (controller, id) splits can stringify to the same key.
        assert_eq!(
            RouteCache::param_key("x_y", "z"),
            RouteCache::param_key("x", "y_z")
        );
    }

    #[test]
    fn stats_start_empty() {
        let cache = RouteCache::new();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
