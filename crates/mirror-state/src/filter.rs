//! The transient mapping path.
//!
//! [`filter_mirror`] produces a single interception handle + mirror binding
//! pair without registering anything in a long-lived registry — for one-off
//! projections, such as projecting one element of a collection on demand.
//! The caller holds the returned pieces and tears them down manually.

use crate::{
    FieldMappings, MirrorHandler, MirrorOptions, PatchCallback, ProxyManager, SourceOps,
    SourceProxy,
};
use serde_json::Value;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

struct MappingInner<K> {
    source: Value,
    handler: MirrorHandler<K>,
}

/// A registry-free binding of one source to exactly one mirror.
///
/// Implements the same mutation entry points as the registry, scoped to its
/// single binding. Cloning shares state, which is how the interception layer
/// holds it.
pub struct MappingHandler<K> {
    inner: Arc<Mutex<MappingInner<K>>>,
}

impl<K> Clone for MappingHandler<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> MappingHandler<K> {
    /// Wrap a source and an already-constructed binding.
    pub fn new(source: Value, handler: MirrorHandler<K>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MappingInner { source, handler })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MappingInner<K>> {
        self.inner.lock().unwrap()
    }

    /// Snapshot of the current source document.
    pub fn source(&self) -> Value {
        self.lock().source.clone()
    }

    /// Read one source field.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.lock().source.get(field).cloned()
    }

    /// Snapshot of the current mirror document.
    pub fn mirror(&self) -> Value {
        self.lock().handler.mirror().clone()
    }

    /// Apply `field = value` to the source and the bound mirror.
    pub fn set_field(&self, field: &str, value: Value) {
        let mut guard = self.lock();
        let MappingInner { source, handler } = &mut *guard;
        if let Some(obj) = source.as_object_mut() {
            obj.insert(field.to_owned(), value.clone());
        }
        handler.run_set_operation(field, &value);
    }

    /// Delete `field` from the source and the bound mirror.
    pub fn delete_field(&self, field: &str) {
        let mut guard = self.lock();
        let MappingInner { source, handler } = &mut *guard;
        if let Some(obj) = source.as_object_mut() {
            obj.remove(field);
        }
        handler.run_delete_operation(field);
    }

    /// Announce an out-of-band mutation of nested source state.
    pub fn descendant_changed(&self) {
        let mut guard = self.lock();
        let MappingInner { source, handler } = &mut *guard;
        handler.descendant_changed(source);
    }
}

impl<K: 'static> SourceOps for MappingHandler<K> {
    fn snapshot(&self) -> Value {
        self.source()
    }

    fn get(&self, field: &str) -> Option<Value> {
        self.get(field)
    }

    fn set_field(&self, field: &str, value: Value) {
        self.set_field(field, value);
    }

    fn delete_field(&self, field: &str) {
        self.delete_field(field);
    }

    fn descendant_changed(&self) {
        self.descendant_changed();
    }
}

impl<K> fmt::Debug for MappingHandler<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingHandler").finish_non_exhaustive()
    }
}

/// Everything [`filter_mirror`] hands back: the interception handle, the
/// populated mirror, and the binding itself for inspection or teardown.
#[derive(Debug)]
pub struct FilteredMirror<K> {
    /// Drop-in substitute for the source; writes propagate to the mirror.
    pub proxy: SourceProxy<K>,
    /// The mirror as populated at creation time.
    pub mirror: Value,
    /// The binding, for later snapshots or manual teardown.
    pub mapping: MappingHandler<K>,
}

/// Project `source` through `mappings` into a single ad-hoc mirror.
///
/// Constructs one binding directly — no registry — obtains its mirror, and
/// caches one interception handle for `key` in `proxies` bound to this
/// binding. Infallible: the contract is supplied directly rather than
/// resolved. Teardown is the caller's job via [`ProxyManager::remove_key`].
///
/// # Examples
///
/// ```
/// use mirror_state::{filter_mirror, FieldMappings, ProxyManager};
/// use serde_json::json;
///
/// let proxies = ProxyManager::new();
/// let filtered = filter_mirror(
///     json!({"name": "a", "secret": 1}),
///     FieldMappings::new().pass("name"),
///     "item-0",
///     &proxies,
///     None,
/// );
///
/// assert_eq!(filtered.mirror, json!({"name": "a"}));
/// filtered.proxy.set("name", "b");
/// assert_eq!(filtered.mapping.mirror(), json!({"name": "b"}));
/// ```
pub fn filter_mirror<K: Clone + Eq + Hash + fmt::Debug + 'static>(
    source: Value,
    mappings: FieldMappings,
    key: K,
    proxies: &ProxyManager<K>,
    patch_callback: Option<PatchCallback>,
) -> FilteredMirror<K> {
    let mut options = MirrorOptions::new();
    options.patch_callback = patch_callback;

    let handler = MirrorHandler::new(key.clone(), &source, mappings, options);
    let mirror = handler.mirror().clone();
    let mapping = MappingHandler::new(source, handler);
    let proxy = proxies.get_proxy(key, Arc::new(mapping.clone()));

    FilteredMirror {
        proxy,
        mirror,
        mapping,
    }
}
