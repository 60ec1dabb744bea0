//! Path-addressed access to JSON documents.
//!
//! These helpers are the write primitives bindings use to maintain their
//! mirrors. Writes create intermediate objects as needed; deletes are no-ops
//! for absent paths.

use crate::Path;
use serde_json::{Map, Value};

/// Get a reference to the value at a path, if present.
pub fn get_at_path<'a>(doc: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = doc;
    for field in path.iter() {
        current = current.get(field)?;
    }
    Some(current)
}

/// Set a value at a path, creating intermediate objects as needed.
///
/// A non-object value along the way is replaced by an object; the mirror is
/// exclusively owned by its binding, so clobbering is safe.
pub(crate) fn set_at_path(doc: &mut Value, path: &Path, value: Value) {
    let Some((last, parents)) = path.fields().split_last() else {
        *doc = value;
        return;
    };

    let mut current = doc;
    for field in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = current
            .as_object_mut()
            .expect("just ensured object")
            .entry(field.clone())
            .or_insert(Value::Null);
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    current
        .as_object_mut()
        .expect("just ensured object")
        .insert(last.clone(), value);
}

/// Remove the value at a path. Returns true if something was removed.
pub(crate) fn delete_at_path(doc: &mut Value, path: &Path) -> bool {
    let Some((last, parents)) = path.fields().split_last() else {
        return false;
    };

    let mut current = doc;
    for field in parents {
        match current.get_mut(field) {
            Some(child) => current = child,
            None => return false,
        }
    }

    match current.as_object_mut() {
        Some(obj) => obj.remove(last).is_some(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    #[test]
    fn test_get_at_path() {
        let doc = json!({"a": {"b": 42}});
        assert_eq!(get_at_path(&doc, &path!("a", "b")), Some(&json!(42)));
        assert_eq!(get_at_path(&doc, &path!("a", "x")), None);
        assert_eq!(get_at_path(&doc, &Path::root()), Some(&doc));
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut doc = json!({});
        set_at_path(&mut doc, &path!("a", "b", "c"), json!(1));
        assert_eq!(doc, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_set_overwrites() {
        let mut doc = json!({"x": 1});
        set_at_path(&mut doc, &path!("x"), json!(2));
        assert_eq!(doc["x"], 2);
    }

    #[test]
    fn test_set_replaces_non_object_parent() {
        let mut doc = json!({"a": 5});
        set_at_path(&mut doc, &path!("a", "b"), json!(1));
        assert_eq!(doc, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_delete_existing() {
        let mut doc = json!({"a": {"b": 1, "c": 2}});
        assert!(delete_at_path(&mut doc, &path!("a", "b")));
        assert_eq!(doc, json!({"a": {"c": 2}}));
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut doc = json!({"a": 1});
        assert!(!delete_at_path(&mut doc, &path!("missing")));
        assert!(!delete_at_path(&mut doc, &path!("a", "b", "c")));
        assert_eq!(doc, json!({"a": 1}));
    }
}
