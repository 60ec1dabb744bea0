//! Mirror bindings.
//!
//! A [`MirrorHandler`] owns one mirror document, applies one field-mapping
//! contract to it, and optionally emits a [`PatchOp`] for every mirror-side
//! change. Handlers never expose their mirror for external mutation; every
//! write flows through mapping-rule application.

use crate::{
    apply::{delete_at_path, get_at_path, set_at_path},
    FieldMappings, PatchOp,
};
use serde_json::{Map, Value};
use std::fmt;

/// Callback invoked with one [`PatchOp`] per mirror-side change.
///
/// Must not call back into the handler that invoked it.
pub type PatchCallback = Box<dyn FnMut(PatchOp)>;

/// Hook that obtains or post-processes the mirror instance at construction.
pub type MirrorInit = Box<dyn FnOnce(Value) -> Value>;

/// Pre-mutation hook run when a descendant of the source changed out-of-band,
/// before derived mirror fields are recomputed.
pub type ChangeHook = Box<dyn FnMut()>;

/// Configuration for a mirror binding.
///
/// All fields default to off; use the builder methods to opt in.
///
/// # Examples
///
/// ```
/// use mirror_state::MirrorOptions;
///
/// let options = MirrorOptions::new()
///     .patch_callback(|op| println!("{:?}", op))
///     .init_before_populate(true);
/// ```
#[derive(Default)]
pub struct MirrorOptions {
    pub(crate) patch_callback: Option<PatchCallback>,
    pub(crate) init_mirror: Option<MirrorInit>,
    pub(crate) init_before_populate: bool,
    pub(crate) before_change: Option<ChangeHook>,
}

impl MirrorOptions {
    /// Create options with everything off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a [`PatchOp`] to `callback` for every mirror-side change.
    pub fn patch_callback(mut self, callback: impl FnMut(PatchOp) + 'static) -> Self {
        self.patch_callback = Some(Box::new(callback));
        self
    }

    /// Obtain or post-process the mirror instance at construction.
    ///
    /// By default the hook runs after initial population and may post-process
    /// the fully populated mirror; see [`MirrorOptions::init_before_populate`].
    pub fn init_mirror(mut self, init: impl FnOnce(Value) -> Value + 'static) -> Self {
        self.init_mirror = Some(Box::new(init));
        self
    }

    /// Run the construction hook before initial population instead of after.
    pub fn init_before_populate(mut self, before: bool) -> Self {
        self.init_before_populate = before;
        self
    }

    /// Run `hook` when a descendant of the source changed out-of-band,
    /// before derived fields are recomputed and before the registry's
    /// post-mutation hook fires.
    pub fn before_change(mut self, hook: impl FnMut() + 'static) -> Self {
        self.before_change = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for MirrorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorOptions")
            .field("patch_callback", &self.patch_callback.is_some())
            .field("init_mirror", &self.init_mirror.is_some())
            .field("init_before_populate", &self.init_before_populate)
            .field("before_change", &self.before_change.is_some())
            .finish()
    }
}

/// Binds one source to one mirror through one field-mapping contract.
pub struct MirrorHandler<K> {
    key: K,
    mappings: FieldMappings,
    mirror: Value,
    patch_callback: Option<PatchCallback>,
    before_change: Option<ChangeHook>,
}

impl<K> MirrorHandler<K> {
    /// Construct a binding and populate its mirror from current source state.
    ///
    /// With `init_before_populate` set, the construction hook transforms the
    /// empty mirror first and population writes into the result; otherwise
    /// population happens first and the hook post-processes the populated
    /// mirror. Initial population emits no patches; patches describe
    /// mutations observed after creation.
    pub fn new(key: K, source: &Value, mappings: FieldMappings, options: MirrorOptions) -> Self {
        let MirrorOptions {
            patch_callback,
            init_mirror,
            init_before_populate,
            before_change,
        } = options;

        let mut mirror = Value::Object(Map::new());
        if init_before_populate {
            if let Some(init) = init_mirror {
                mirror = init(mirror);
            }
            mappings.project_into(source, &mut mirror);
        } else {
            mappings.project_into(source, &mut mirror);
            if let Some(init) = init_mirror {
                mirror = init(mirror);
            }
        }

        Self {
            key,
            mappings,
            mirror,
            patch_callback,
            before_change,
        }
    }

    /// The key this binding is registered under.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The current mirror document.
    #[inline]
    pub fn mirror(&self) -> &Value {
        &self.mirror
    }

    /// Consume the binding and return its mirror.
    pub fn into_mirror(self) -> Value {
        self.mirror
    }

    /// The contract this binding projects through.
    #[inline]
    pub fn mappings(&self) -> &FieldMappings {
        &self.mappings
    }

    /// Apply `field = value` source semantics to the mirror.
    ///
    /// Silent no-op for unmapped fields; not every source field need project
    /// into every mirror.
    pub fn run_set_operation(&mut self, field: &str, value: &Value) {
        let Some(rules) = self.mappings.rules_for(field) else {
            return;
        };

        for rule in rules {
            let computed = rule.project(value);
            if let Some(callback) = self.patch_callback.as_mut() {
                set_at_path(&mut self.mirror, rule.target(), computed.clone());
                callback(PatchOp::set(rule.target().clone(), computed));
            } else {
                set_at_path(&mut self.mirror, rule.target(), computed);
            }
        }
    }

    /// Apply source-field deletion semantics to the mirror.
    ///
    /// Removes each rule's target path and emits one Delete patch per path.
    /// No-op for unmapped fields.
    pub fn run_delete_operation(&mut self, field: &str) {
        let Some(rules) = self.mappings.rules_for(field) else {
            return;
        };

        for rule in rules {
            delete_at_path(&mut self.mirror, rule.target());
            if let Some(callback) = self.patch_callback.as_mut() {
                callback(PatchOp::delete(rule.target().clone()));
            }
        }
    }

    /// React to a source descendant that was mutated out-of-band.
    ///
    /// Runs the `before_change` hook, then recomputes every nested-contract
    /// rule from current source state. A Set patch is emitted only for
    /// targets whose projected value actually changed.
    pub fn descendant_changed(&mut self, source: &Value) {
        if let Some(hook) = self.before_change.as_mut() {
            hook();
        }

        for (field, rules) in self.mappings.iter() {
            let Some(value) = source.get(field) else {
                continue;
            };
            for rule in rules.iter().filter(|rule| rule.is_nested()) {
                let computed = rule.project(value);
                if get_at_path(&self.mirror, rule.target()) == Some(&computed) {
                    continue;
                }
                set_at_path(&mut self.mirror, rule.target(), computed.clone());
                if let Some(callback) = self.patch_callback.as_mut() {
                    callback(PatchOp::set(rule.target().clone(), computed));
                }
            }
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for MirrorHandler<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorHandler")
            .field("key", &self.key)
            .field("mirror", &self.mirror)
            .field("patch_callback", &self.patch_callback.is_some())
            .field("before_change", &self.before_change.is_some())
            .finish()
    }
}
