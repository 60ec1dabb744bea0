//! The source registry.
//!
//! A [`SourceHandler`] owns one source document and the set of live mirror
//! bindings derived from it. Every mutation entry point fans out to all
//! bindings in registration order before control returns to the caller, then
//! fires the registry-level post-mutation hook exactly once.
//!
//! Cloning a handler shares its state; handing a clone to the proxy layer is
//! how interception handles route mutations back into the registry.

use crate::{
    FieldMappings, MirrorError, MirrorHandler, MirrorOptions, MirrorResult, ProxyManager,
    SourceOps, SourceProxy,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

/// Resolves the field-mapping contract for a mirror key.
pub type MappingResolver<K> = Box<dyn Fn(&K) -> Option<FieldMappings>>;

/// Registry-level hook fired once after each mutation's fan-out completes.
///
/// Runs with no registry lock held, so it may read back through the handler
/// (`source()`, `get()`, `mirror(..)`).
pub type AfterChange = Box<dyn FnMut()>;

struct SourceInner<K> {
    source: Value,
    mirrors: IndexMap<K, MirrorHandler<K>>,
    resolve: MappingResolver<K>,
}

/// Owns a source document and broadcasts every mutation to all live mirror
/// bindings in registration order.
///
/// # Examples
///
/// ```
/// use mirror_state::{FieldMappings, MirrorOptions, ProxyManager, SourceHandler};
/// use serde_json::json;
///
/// let handler = SourceHandler::new(
///     json!({"name": "a"}),
///     |_key: &&str| Some(FieldMappings::new().map("name", "displayName")),
///     ProxyManager::new(),
/// );
///
/// handler.create_mirror("ui", MirrorOptions::new()).unwrap();
/// handler.set_field("name", json!("b"));
///
/// assert_eq!(handler.mirror(&"ui").unwrap(), json!({"displayName": "b"}));
/// ```
pub struct SourceHandler<K> {
    inner: Arc<Mutex<SourceInner<K>>>,
    // Kept outside `inner` so the hook runs with no registry lock held.
    after_change: Arc<Mutex<Option<AfterChange>>>,
    proxies: ProxyManager<K>,
}

impl<K> Clone for SourceHandler<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            after_change: Arc::clone(&self.after_change),
            proxies: self.proxies.clone(),
        }
    }
}

impl<K: Clone + Eq + Hash + fmt::Debug + 'static> SourceHandler<K> {
    /// Create a registry owning `source`.
    ///
    /// `resolve` supplies the field-mapping contract for each mirror key;
    /// `proxies` is the (possibly shared) interception cache that
    /// [`SourceHandler::remove_mirror`] keeps in step with the registry.
    pub fn new(
        source: Value,
        resolve: impl Fn(&K) -> Option<FieldMappings> + 'static,
        proxies: ProxyManager<K>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SourceInner {
                source,
                mirrors: IndexMap::new(),
                resolve: Box::new(resolve),
            })),
            after_change: Arc::new(Mutex::new(None)),
            proxies,
        }
    }

    /// Fire `hook` once after each mutation's fan-out completes.
    ///
    /// The hook runs with no registry lock held and may read back through
    /// the handler. A mutation made from inside the hook propagates but does
    /// not re-fire the hook.
    pub fn with_after_change(self, hook: impl FnMut() + 'static) -> Self {
        *self.after_change.lock().unwrap() = Some(Box::new(hook));
        self
    }

    fn lock(&self) -> MutexGuard<'_, SourceInner<K>> {
        self.inner.lock().unwrap()
    }

    fn fire_after_change(&self) {
        let hook = self.after_change.lock().unwrap().take();
        if let Some(mut hook) = hook {
            hook();
            let mut slot = self.after_change.lock().unwrap();
            // A hook swapped in mid-call wins over the one we took out.
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
    }

    /// Snapshot of the current source document.
    pub fn source(&self) -> Value {
        self.lock().source.clone()
    }

    /// Read one source field.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.lock().source.get(field).cloned()
    }

    /// Create a mirror binding under `key` and return the populated mirror.
    ///
    /// Fails with [`MirrorError::MappingsUnresolved`] if the resolver yields
    /// no contract for `key`; bindings already present for other keys are
    /// untouched by the failure. An existing binding at the same key is
    /// explicitly torn down first — registry entry and cached interception
    /// handle both — so no handle outlives its binding.
    pub fn create_mirror(&self, key: K, options: MirrorOptions) -> MirrorResult<Value> {
        let mut inner = self.inner.lock().map_err(|_| MirrorError::HandlerPoisoned)?;

        let mappings =
            (inner.resolve)(&key).ok_or_else(|| MirrorError::mappings_unresolved(&key))?;

        if inner.mirrors.shift_remove(&key).is_some() {
            self.proxies.remove_key(&key);
            debug!(?key, "tearing down existing binding before reinstall");
        }

        let handler = MirrorHandler::new(key.clone(), &inner.source, mappings, options);
        let mirror = handler.mirror().clone();
        inner.mirrors.insert(key.clone(), handler);
        debug!(?key, mirrors = inner.mirrors.len(), "mirror created");

        Ok(mirror)
    }

    /// Drop the binding at `key` and release its interception handle,
    /// returning the binding's final mirror.
    ///
    /// Both removals happen as one step; a handle never survives its binding.
    /// Returns `None` (not an error) if `key` has no live binding.
    pub fn remove_mirror(&self, key: &K) -> Option<Value> {
        let mut inner = self.lock();
        let removed = inner.mirrors.shift_remove(key);
        if removed.is_some() {
            debug!(?key, mirrors = inner.mirrors.len(), "mirror removed");
        }
        self.proxies.remove_key(key);
        removed.map(MirrorHandler::into_mirror)
    }

    /// Apply `field = value` to the source and every live binding in
    /// registration order, then fire the post-mutation hook once.
    pub fn set_field(&self, field: &str, value: Value) {
        {
            let mut guard = self.lock();
            let SourceInner {
                source, mirrors, ..
            } = &mut *guard;

            if let Some(obj) = source.as_object_mut() {
                obj.insert(field.to_owned(), value.clone());
            }

            trace!(field, mirrors = mirrors.len(), "fanning out set");
            for handler in mirrors.values_mut() {
                handler.run_set_operation(field, &value);
            }
        }
        self.fire_after_change();
    }

    /// Delete `field` from the source and every live binding in registration
    /// order, then fire the post-mutation hook once.
    pub fn delete_field(&self, field: &str) {
        {
            let mut guard = self.lock();
            let SourceInner {
                source, mirrors, ..
            } = &mut *guard;

            if let Some(obj) = source.as_object_mut() {
                obj.remove(field);
            }

            trace!(field, mirrors = mirrors.len(), "fanning out delete");
            for handler in mirrors.values_mut() {
                handler.run_delete_operation(field);
            }
        }
        self.fire_after_change();
    }

    /// Announce that nested source state was mutated without going through
    /// [`SourceHandler::set_field`] / [`SourceHandler::delete_field`].
    ///
    /// Every binding's pre-mutation recompute path runs first, across all
    /// bindings in registration order, before the post-mutation hook fires
    /// once — derived mirror fields settle before external observers are
    /// told anything changed.
    pub fn descendant_changed(&self) {
        {
            let mut guard = self.lock();
            let SourceInner {
                source, mirrors, ..
            } = &mut *guard;

            trace!(mirrors = mirrors.len(), "descendant changed");
            for handler in mirrors.values_mut() {
                handler.descendant_changed(source);
            }
        }
        self.fire_after_change();
    }

    /// Snapshot of the mirror at `key`, if a binding is live.
    pub fn mirror(&self, key: &K) -> Option<Value> {
        self.lock().mirrors.get(key).map(|h| h.mirror().clone())
    }

    /// Check whether a binding is live at `key`.
    pub fn contains_mirror(&self, key: &K) -> bool {
        self.lock().mirrors.contains_key(key)
    }

    /// Number of live mirror bindings.
    pub fn mirror_count(&self) -> usize {
        self.lock().mirrors.len()
    }

    /// Get (or create) the interception handle for `key`, bound to this
    /// registry. Mutating the handle is observably equivalent to calling the
    /// registry's mutation entry points directly.
    pub fn proxy(&self, key: K) -> SourceProxy<K> {
        self.proxies.get_proxy(key, Arc::new(self.clone()))
    }

    /// The interception cache this registry keeps in step with its bindings.
    pub fn proxy_manager(&self) -> &ProxyManager<K> {
        &self.proxies
    }
}

impl<K: Clone + Eq + Hash + fmt::Debug + 'static> SourceOps for SourceHandler<K> {
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

impl<K: fmt::Debug> fmt::Debug for SourceHandler<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceHandler").finish_non_exhaustive()
    }
}
