//! Patch operations describing mirror-side changes.
//!
//! Each operation describes exactly one change that a source mutation caused
//! in mirror space. Bindings hand these to the caller-supplied patch callback
//! in the order the changes were applied.

use crate::Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single mirror-side change.
///
/// Emitted once per affected mirror path per source mutation. The `path` is
/// expressed in mirror space, not source space; a rule mapping `a -> b`
/// produces operations targeting `b`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOp {
    /// A value was written at the path.
    Set {
        /// Target mirror path.
        path: Path,
        /// The value that was written.
        value: Value,
    },

    /// The value at the path was removed.
    Delete {
        /// Target mirror path.
        path: Path,
    },
}

impl PatchOp {
    /// Create a Set operation.
    #[inline]
    pub fn set(path: Path, value: impl Into<Value>) -> Self {
        PatchOp::Set {
            path,
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    #[inline]
    pub fn delete(path: Path) -> Self {
        PatchOp::Delete { path }
    }

    /// Get the mirror path this operation targets.
    #[inline]
    pub fn path(&self) -> &Path {
        match self {
            PatchOp::Set { path, .. } => path,
            PatchOp::Delete { path } => path,
        }
    }

    /// Get the written value, present only for Set operations.
    #[inline]
    pub fn value(&self) -> Option<&Value> {
        match self {
            PatchOp::Set { value, .. } => Some(value),
            PatchOp::Delete { .. } => None,
        }
    }

    /// Get the operation name.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            PatchOp::Set { .. } => "set",
            PatchOp::Delete { .. } => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    #[test]
    fn test_op_constructors() {
        let set = PatchOp::set(path!("b"), json!(5));
        assert_eq!(set.name(), "set");
        assert_eq!(set.path(), &path!("b"));
        assert_eq!(set.value(), Some(&json!(5)));

        let del = PatchOp::delete(path!("b"));
        assert_eq!(del.name(), "delete");
        assert_eq!(del.value(), None);
    }

    #[test]
    fn test_op_serde() {
        let op = PatchOp::set(path!("user", "name"), json!("Alice"));
        let json = serde_json::to_string(&op).unwrap();
        let parsed: PatchOp = serde_json::from_str(&json).unwrap();
        assert_eq!(op, parsed);
    }

    #[test]
    fn test_delete_has_no_value_field() {
        let op = PatchOp::delete(path!("b"));
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json, serde_json::json!({"op": "delete", "path": ["b"]}));
    }
}
