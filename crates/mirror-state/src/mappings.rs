//! Field-mapping contracts.
//!
//! A [`FieldMappings`] value declares how source fields become mirror fields:
//! each source field maps to one or more rules, and each rule names a target
//! mirror path, an optional transform, and optionally a nested contract for
//! recursive projection of structured values.
//!
//! Contracts are pure data. Transforms must be deterministic and
//! side-effect-free: the same `(contract, source value)` pair always yields
//! the same mirror value, and a transform must never reach back into the
//! handler that invoked it.

use crate::{apply::set_at_path, Path};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A pure projection applied to a source value before it is written to the
/// mirror.
pub type Transform = Arc<dyn Fn(&Value) -> Value>;

/// One projection rule: where a source field lands in the mirror and how its
/// value is derived.
#[derive(Clone)]
pub struct MappingRule {
    target: Path,
    transform: Option<Transform>,
    nested: Option<FieldMappings>,
}

impl MappingRule {
    fn new(target: Path) -> Self {
        Self {
            target,
            transform: None,
            nested: None,
        }
    }

    /// The mirror path this rule writes to.
    #[inline]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Whether this rule projects through a nested contract.
    ///
    /// Nested rules depend on structured source state rather than a single
    /// flat field, so they are the ones recomputed when a descendant of the
    /// source changes out-of-band.
    #[inline]
    pub fn is_nested(&self) -> bool {
        self.nested.is_some()
    }

    /// Compute the mirror value for a source value under this rule.
    pub fn project(&self, value: &Value) -> Value {
        if let Some(nested) = &self.nested {
            nested.project(value)
        } else if let Some(transform) = &self.transform {
            transform(value)
        } else {
            value.clone()
        }
    }
}

impl fmt::Debug for MappingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRule")
            .field("target", &self.target)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .field("nested", &self.nested)
            .finish()
    }
}

/// A declarative contract mapping source fields to mirror paths.
///
/// Built once, then treated as immutable. Rule insertion order is preserved
/// and governs the order of writes (and emitted patches) when one source
/// field projects to several mirror paths.
///
/// # Examples
///
/// ```
/// use mirror_state::{path, FieldMappings};
/// use serde_json::json;
///
/// let mappings = FieldMappings::new()
///     .pass("name")
///     .map("age", "yearsOld")
///     .map_with("score", "grade", |v| json!(v.as_i64().unwrap_or(0) / 10));
///
/// let mirror = mappings.project(&json!({"name": "a", "age": 1, "score": 87}));
/// assert_eq!(mirror, json!({"name": "a", "yearsOld": 1, "grade": 8}));
/// ```
#[derive(Clone, Default)]
pub struct FieldMappings {
    rules: IndexMap<String, Vec<MappingRule>>,
}

impl FieldMappings {
    /// Create an empty contract.
    pub fn new() -> Self {
        Self::default()
    }

    fn add_rule(mut self, field: impl Into<String>, rule: MappingRule) -> Self {
        self.rules.entry(field.into()).or_default().push(rule);
        self
    }

    /// Project a source field to the mirror field of the same name.
    pub fn pass(self, field: impl Into<String>) -> Self {
        let field = field.into();
        let rule = MappingRule::new(Path::from(field.clone()));
        self.add_rule(field, rule)
    }

    /// Project a source field to a differently named mirror field.
    pub fn map(self, field: impl Into<String>, target: impl Into<String>) -> Self {
        self.add_rule(field, MappingRule::new(Path::from(target.into())))
    }

    /// Project a source field to a nested mirror path.
    pub fn map_path(self, field: impl Into<String>, target: Path) -> Self {
        self.add_rule(field, MappingRule::new(target))
    }

    /// Project a source field through a transform.
    pub fn map_with(
        self,
        field: impl Into<String>,
        target: impl Into<String>,
        transform: impl Fn(&Value) -> Value + 'static,
    ) -> Self {
        let mut rule = MappingRule::new(Path::from(target.into()));
        rule.transform = Some(Arc::new(transform));
        self.add_rule(field, rule)
    }

    /// Project a source field through a transform to a nested mirror path.
    pub fn map_path_with(
        self,
        field: impl Into<String>,
        target: Path,
        transform: impl Fn(&Value) -> Value + 'static,
    ) -> Self {
        let mut rule = MappingRule::new(target);
        rule.transform = Some(Arc::new(transform));
        self.add_rule(field, rule)
    }

    /// Project a structured source field through a nested contract.
    ///
    /// The nested contract is applied recursively to the field's value, and
    /// the projected object is written at `target`.
    pub fn map_nested(
        self,
        field: impl Into<String>,
        target: impl Into<String>,
        nested: FieldMappings,
    ) -> Self {
        let mut rule = MappingRule::new(Path::from(target.into()));
        rule.nested = Some(nested);
        self.add_rule(field, rule)
    }

    /// Get the rules for a source field, if any.
    #[inline]
    pub fn rules_for(&self, field: &str) -> Option<&[MappingRule]> {
        self.rules.get(field).map(Vec::as_slice)
    }

    /// Iterate over `(source field, rules)` pairs in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[MappingRule])> {
        self.rules.iter().map(|(f, r)| (f.as_str(), r.as_slice()))
    }

    /// Check if this contract has no rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Get the number of mapped source fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether any rule carries a nested contract.
    pub fn has_nested(&self) -> bool {
        self.rules
            .values()
            .flatten()
            .any(|rule| rule.is_nested())
    }

    /// Project an entire source value into a fresh mirror object.
    ///
    /// Applies every rule against the source's current value for its field;
    /// fields absent from the source are skipped.
    pub fn project(&self, source: &Value) -> Value {
        let mut mirror = Value::Object(Map::new());
        self.project_into(source, &mut mirror);
        mirror
    }

    /// Apply every rule against `source`, writing into an existing mirror.
    pub(crate) fn project_into(&self, source: &Value, mirror: &mut Value) {
        for (field, rules) in &self.rules {
            let Some(value) = source.get(field) else {
                continue;
            };
            for rule in rules {
                set_at_path(mirror, rule.target(), rule.project(value));
            }
        }
    }
}

impl fmt::Debug for FieldMappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.rules.iter()).finish()
    }
}
