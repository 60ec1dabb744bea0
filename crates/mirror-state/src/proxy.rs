//! The interception layer.
//!
//! Languages with trap-based proxies intercept ordinary property assignment;
//! here interception is an explicit accessor object instead. A
//! [`SourceProxy`] is observably interchangeable with its source for reads,
//! and routes every write or delete through the bound handler's mutation
//! entry points — source update, fan-out, and post-mutation hooks all
//! complete synchronously before the call returns.
//!
//! [`ProxyManager`] caches one handle per key. Removing a key discards the
//! cached handle; continuing to use a stale clone afterwards is a caller
//! error the core does not guard against.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Mutation entry points shared by the registry and the transient mapping
/// path. Everything a proxy handle needs from its bound handler.
pub trait SourceOps {
    /// Snapshot of the current source document.
    fn snapshot(&self) -> Value;

    /// Read one source field.
    fn get(&self, field: &str) -> Option<Value>;

    /// Apply `field = value` to the source and fan out to all bound mirrors.
    fn set_field(&self, field: &str, value: Value);

    /// Delete a source field and fan out to all bound mirrors.
    fn delete_field(&self, field: &str);

    /// Announce that a value reachable from the source was mutated without
    /// going through [`SourceOps::set_field`] / [`SourceOps::delete_field`].
    fn descendant_changed(&self);
}

/// A transparent handle over a source, bound to a mutation handler.
///
/// Reads pass through to the underlying source unchanged; writes and deletes
/// are forwarded to the handler and complete their entire fan-out before the
/// call returns.
pub struct SourceProxy<K> {
    key: K,
    ops: Arc<dyn SourceOps>,
}

impl<K: Clone> Clone for SourceProxy<K> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            ops: Arc::clone(&self.ops),
        }
    }
}

impl<K> SourceProxy<K> {
    /// The key this handle was cached under.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Snapshot of the current source document.
    pub fn snapshot(&self) -> Value {
        self.ops.snapshot()
    }

    /// Read one source field.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.ops.get(field)
    }

    /// Write a source field, triggering propagation to every bound mirror.
    pub fn set(&self, field: &str, value: impl Into<Value>) {
        self.ops.set_field(field, value.into());
    }

    /// Delete a source field, triggering propagation to every bound mirror.
    pub fn delete(&self, field: &str) {
        self.ops.delete_field(field);
    }

    /// Announce an out-of-band mutation of nested source state.
    pub fn descendant_changed(&self) {
        self.ops.descendant_changed();
    }
}

impl<K: fmt::Debug> fmt::Debug for SourceProxy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceProxy").field("key", &self.key).finish()
    }
}

/// Cache of one [`SourceProxy`] handle per key.
///
/// Cloning shares the cache; a manager can serve any number of handlers.
pub struct ProxyManager<K> {
    proxies: Arc<Mutex<IndexMap<K, SourceProxy<K>>>>,
}

impl<K> Clone for ProxyManager<K> {
    fn clone(&self) -> Self {
        Self {
            proxies: Arc::clone(&self.proxies),
        }
    }
}

impl<K> Default for ProxyManager<K> {
    fn default() -> Self {
        Self {
            proxies: Arc::new(Mutex::new(IndexMap::new())),
        }
    }
}

impl<K: Clone + Eq + Hash + fmt::Debug> ProxyManager<K> {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached handle for `key`, creating one bound to `ops` if none
    /// exists. A cached handle keeps its original binding; `ops` is ignored
    /// on a cache hit.
    pub fn get_proxy(&self, key: K, ops: Arc<dyn SourceOps>) -> SourceProxy<K> {
        let mut proxies = self.proxies.lock().unwrap();
        if let Some(proxy) = proxies.get(&key) {
            return proxy.clone();
        }

        trace!(?key, "caching new source proxy");
        let proxy = SourceProxy {
            key: key.clone(),
            ops,
        };
        proxies.insert(key, proxy.clone());
        proxy
    }

    /// Discard the cached handle for `key`. Returns true if one was cached.
    ///
    /// Any previously handed-out clone of the handle becomes stale; using it
    /// afterwards is a caller error.
    pub fn remove_key(&self, key: &K) -> bool {
        let removed = self.proxies.lock().unwrap().shift_remove(key).is_some();
        if removed {
            trace!(?key, "discarded source proxy");
        }
        removed
    }

    /// Check whether a handle is cached for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.proxies.lock().unwrap().contains_key(key)
    }

    /// Get the number of cached handles.
    pub fn len(&self) -> usize {
        self.proxies.lock().unwrap().len()
    }

    /// Check if no handles are cached.
    pub fn is_empty(&self) -> bool {
        self.proxies.lock().unwrap().is_empty()
    }
}

impl<K> fmt::Debug for ProxyManager<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Stub {
        label: &'static str,
        calls: Mutex<Vec<String>>,
    }

    impl Stub {
        fn new(label: &'static str) -> Arc<Self> {
            Arc::new(Self {
                label,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl SourceOps for Stub {
        fn snapshot(&self) -> Value {
            json!({"stub": self.label})
        }

        fn get(&self, field: &str) -> Option<Value> {
            (field == "stub").then(|| json!(self.label))
        }

        fn set_field(&self, field: &str, value: Value) {
            self.calls.lock().unwrap().push(format!("set {field}={value}"));
        }

        fn delete_field(&self, field: &str) {
            self.calls.lock().unwrap().push(format!("delete {field}"));
        }

        fn descendant_changed(&self) {
            self.calls.lock().unwrap().push("descendant".into());
        }
    }

    #[test]
    fn test_proxy_routes_mutations_to_handler() {
        let stub = Stub::new("s");
        let manager = ProxyManager::new();
        let proxy = manager.get_proxy("k", stub.clone());

        proxy.set("a", 1);
        proxy.delete("b");
        proxy.descendant_changed();

        assert_eq!(
            stub.calls.lock().unwrap().as_slice(),
            ["set a=1", "delete b", "descendant"]
        );
    }

    #[test]
    fn test_proxy_reads_pass_through() {
        let manager = ProxyManager::new();
        let proxy = manager.get_proxy("k", Stub::new("s"));

        assert_eq!(proxy.snapshot(), json!({"stub": "s"}));
        assert_eq!(proxy.get("stub"), Some(json!("s")));
        assert_eq!(proxy.get("missing"), None);
    }

    #[test]
    fn test_cache_hit_keeps_original_binding() {
        let first = Stub::new("first");
        let second = Stub::new("second");
        let manager = ProxyManager::new();

        let _ = manager.get_proxy("k", first.clone());
        let cached = manager.get_proxy("k", second.clone());
        cached.set("a", 1);

        assert_eq!(first.calls.lock().unwrap().len(), 1);
        assert!(second.calls.lock().unwrap().is_empty());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_remove_key_is_idempotent() {
        let manager = ProxyManager::new();
        let _ = manager.get_proxy("k", Stub::new("s"));

        assert!(manager.remove_key(&"k"));
        assert!(!manager.remove_key(&"k"));
        assert!(!manager.contains_key(&"k"));
        assert!(manager.is_empty());
    }
}
