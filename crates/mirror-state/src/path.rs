//! Mirror-space paths.
//!
//! A path is an ordered sequence of field identifiers describing where a
//! projected value lives inside a mirror document. Mapping rules may target
//! nested paths, so a path can be more than one segment deep.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered sequence of field identifiers into a mirror document.
///
/// # Examples
///
/// ```
/// use mirror_state::Path;
///
/// let path = Path::root().field("user").field("name");
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.to_string(), "$.user.name");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<String>);

impl Path {
    /// Create an empty path (root).
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create a path from a vector of field identifiers.
    #[inline]
    pub fn from_fields(fields: Vec<String>) -> Self {
        Self(fields)
    }

    /// Append a field identifier and return self (builder pattern).
    #[inline]
    pub fn field(mut self, f: impl Into<String>) -> Self {
        self.0.push(f.into());
        self
    }

    /// Push a field identifier onto the path (mutating).
    #[inline]
    pub fn push(&mut self, f: impl Into<String>) {
        self.0.push(f.into());
    }

    /// Pop the last field identifier from the path.
    #[inline]
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// Get the field identifiers of this path.
    #[inline]
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Check if this path is empty (root).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of field identifiers in this path.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get the last field identifier.
    #[inline]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Join this path with another path.
    #[inline]
    pub fn join(&self, other: &Path) -> Path {
        let mut result = self.clone();
        result.0.extend(other.0.iter().cloned());
        result
    }

    /// Get the parent path (path without the last field identifier).
    #[inline]
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            Some(Path(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Iterate over the field identifiers.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for field in &self.0 {
            write!(f, ".{}", field)?;
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(field: &str) -> Self {
        Path(vec![field.to_owned()])
    }
}

impl From<String> for Path {
    fn from(field: String) -> Self {
        Path(vec![field])
    }
}

impl FromIterator<String> for Path {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl IntoIterator for Path {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Construct a [`Path`] from a sequence of field identifiers.
///
/// # Examples
///
/// ```
/// use mirror_state::path;
///
/// let p = path!("user", "address", "city");
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($field:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($field);
        )+
        p
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_construction() {
        let path = Path::root().field("user").field("name");
        assert_eq!(path.len(), 2);
        assert_eq!(path.fields(), ["user", "name"]);
    }

    #[test]
    fn test_path_display() {
        let path = Path::root().field("user").field("name");
        assert_eq!(path.to_string(), "$.user.name");
        assert_eq!(Path::root().to_string(), "$");
    }

    #[test]
    fn test_path_macro() {
        let p = path!("a", "b", "c");
        assert_eq!(p.len(), 3);
        assert_eq!(p.last(), Some("c"));
    }

    #[test]
    fn test_path_join() {
        let base = path!("mirror");
        let joined = base.join(&path!("inner", "leaf"));
        assert_eq!(joined, path!("mirror", "inner", "leaf"));
    }

    #[test]
    fn test_path_parent() {
        let path = path!("a", "b");
        assert_eq!(path.parent(), Some(path!("a")));
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn test_path_serde() {
        let path = path!("user", "name");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"["user","name"]"#);
        let parsed: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(path, parsed);
    }
}
