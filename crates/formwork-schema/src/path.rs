//! Value paths for addressing into a form's value tree
//!
//! Provides [`FieldPath`] for hierarchical addressing of values, mixing
//! object keys and array indices.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One step of a [`FieldPath`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// Object property
    Key(String),

    /// Array position
    Index(usize),
}

impl PathSegment {
    /// Key name, if this is a key segment
    #[inline]
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Index(_) => None,
        }
    }

    /// Position, if this is an index segment
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Key(_) => None,
        }
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Path within a value tree
///
/// Rendered in dot notation with array positions as plain numbers.
///
/// # Examples
/// - `["title"]` → `title`
/// - `["requests", 0, "endpoint"]` → `requests.0.endpoint`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Create path from a single key
    #[inline]
    #[must_use]
    pub fn single(key: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(key.into())])
    }

    /// Empty path (the whole value tree)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Append a key, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(PathSegment::Key(key.into()));
        new
    }

    /// Append an array position, returning new path
    #[inline]
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut new = self.clone();
        new.0.push(PathSegment::Index(index));
        new
    }

    /// Concatenate a relative path onto this one
    #[inline]
    #[must_use]
    pub fn join(&self, relative: &Self) -> Self {
        let mut new = self.clone();
        new.0.extend(relative.0.iter().cloned());
        new
    }

    /// Check if this path is a prefix of another
    ///
    /// # Examples
    /// - `requests` is prefix of `requests.0.endpoint`
    /// - `requests` is NOT prefix of `responses.0`
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Check if this path is an ancestor of another (strict prefix)
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Check if paths overlap (one is prefix of other)
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Get relative path from ancestor
    ///
    /// # Errors
    /// Returns error if `self` is not a descendant of `ancestor`
    pub fn relative_to(&self, ancestor: &Self) -> Result<Self, PathError> {
        if !ancestor.is_prefix_of(self) {
            return Err(PathError::NotDescendant {
                path: self.to_string(),
                ancestor: ancestor.to_string(),
            });
        }
        Ok(Self(self.0[ancestor.0.len()..].to_vec()))
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &PathSegment> {
        self.0.iter()
    }

    /// Read the value this path addresses inside `root`
    #[must_use]
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(root, |node, seg| match (node, seg) {
            (Value::Object(map), PathSegment::Key(key)) => map.get(key),
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        })
    }

    /// Replace every index segment with `*`
    ///
    /// Two concrete paths into different items of the same array share a
    /// pattern, e.g. `requests.0.endpoint` and `requests.4.endpoint` both
    /// become `requests.*.endpoint`.
    #[must_use]
    pub fn pattern(&self) -> String {
        self.0
            .iter()
            .map(|seg| match seg {
                PathSegment::Key(key) => key.clone(),
                PathSegment::Index(_) => "*".to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for part in s.split('.') {
            parse_part(part, &mut segments)?;
        }
        Ok(Self(segments))
    }
}

/// Parse one dot-separated part, which may carry bracket indices (`items[2]`)
fn parse_part(part: &str, segments: &mut Vec<PathSegment>) -> Result<(), PathError> {
    let (head, mut rest) = match part.find('[') {
        Some(pos) => (&part[..pos], &part[pos..]),
        None => (part, ""),
    };

    if head.is_empty() && rest.is_empty() {
        return Err(PathError::EmptySegment);
    }
    if !head.is_empty() {
        if head.contains(']') {
            return Err(PathError::MalformedIndex(part.to_string()));
        }
        segments.push(match head.parse::<usize>() {
            Ok(index) => PathSegment::Index(index),
            Err(_) => PathSegment::Key(head.to_string()),
        });
    } else if segments.is_empty() {
        // A leading bracket has nothing to index into
        return Err(PathError::MalformedIndex(part.to_string()));
    }

    while !rest.is_empty() {
        let close = rest
            .find(']')
            .ok_or_else(|| PathError::MalformedIndex(part.to_string()))?;
        let index = rest[1..close]
            .parse::<usize>()
            .map_err(|_| PathError::MalformedIndex(part.to_string()))?;
        segments.push(PathSegment::Index(index));
        rest = &rest[close + 1..];
        if !rest.is_empty() && !rest.starts_with('[') {
            return Err(PathError::MalformedIndex(part.to_string()));
        }
    }
    Ok(())
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to value paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Bracket index that is unterminated or not a number
    #[error("malformed index in segment: {0}")]
    MalformedIndex(String),

    /// Not a descendant path
    #[error("path '{path}' is not a descendant of '{ancestor}'")]
    NotDescendant { path: String, ancestor: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_single_and_display() {
        let path = FieldPath::single("title");
        assert_eq!(path.len(), 1);
        assert_eq!(path.to_string(), "title");
    }

    #[test]
    fn path_root() {
        let path = FieldPath::root();
        assert!(path.is_empty());
        assert_eq!(path.to_string(), "");
        assert!(path.parent().is_none());
    }

    #[test]
    fn path_child_and_index() {
        let path = FieldPath::single("requests").index(1).child("endpoint");
        assert_eq!(path.to_string(), "requests.1.endpoint");
        assert_eq!(path.last(), Some(&PathSegment::Key("endpoint".into())));
    }

    #[test]
    fn path_join_relative() {
        let base = FieldPath::single("requests").index(0);
        let relative: FieldPath = "headers.name".parse().unwrap();
        assert_eq!(base.join(&relative).to_string(), "requests.0.headers.name");
    }

    #[test]
    fn path_parse_numeric_segment_is_index() {
        let path: FieldPath = "requests.2.endpoint".parse().unwrap();
        assert_eq!(path.segments()[1], PathSegment::Index(2));
    }

    #[test]
    fn path_parse_bracket_notation() {
        let dotted: FieldPath = "requests.2.endpoint".parse().unwrap();
        let bracketed: FieldPath = "requests[2].endpoint".parse().unwrap();
        assert_eq!(dotted, bracketed);

        let nested: FieldPath = "grid[1][3]".parse().unwrap();
        assert_eq!(nested.to_string(), "grid.1.3");
    }

    #[test]
    fn path_parse_errors() {
        assert_eq!("a..b".parse::<FieldPath>(), Err(PathError::EmptySegment));
        assert!(matches!(
            "a[x]".parse::<FieldPath>(),
            Err(PathError::MalformedIndex(_))
        ));
        assert!(matches!(
            "a[1".parse::<FieldPath>(),
            Err(PathError::MalformedIndex(_))
        ));
        assert!(matches!(
            "[0]".parse::<FieldPath>(),
            Err(PathError::MalformedIndex(_))
        ));
        assert!(matches!(
            "a[0]b".parse::<FieldPath>(),
            Err(PathError::MalformedIndex(_))
        ));
    }

    #[test]
    fn path_prefix_relations() {
        let parent: FieldPath = "requests".parse().unwrap();
        let child: FieldPath = "requests.0.endpoint".parse().unwrap();
        let other: FieldPath = "responses.0".parse().unwrap();

        assert!(parent.is_prefix_of(&child));
        assert!(parent.is_ancestor_of(&child));
        assert!(!parent.is_ancestor_of(&parent));
        assert!(child.overlaps(&parent));
        assert!(!parent.overlaps(&other));
    }

    #[test]
    fn path_relative_to() {
        let full: FieldPath = "requests.0.endpoint".parse().unwrap();
        let ancestor: FieldPath = "requests.0".parse().unwrap();
        assert_eq!(full.relative_to(&ancestor).unwrap().to_string(), "endpoint");

        let unrelated: FieldPath = "title".parse().unwrap();
        assert!(matches!(
            full.relative_to(&unrelated),
            Err(PathError::NotDescendant { .. })
        ));
    }

    #[test]
    fn path_pattern_erases_indices() {
        let a: FieldPath = "requests.0.endpoint".parse().unwrap();
        let b: FieldPath = "requests.4.endpoint".parse().unwrap();
        assert_eq!(a.pattern(), "requests.*.endpoint");
        assert_eq!(a.pattern(), b.pattern());
    }

    #[test]
    fn path_lookup() {
        let tree = serde_json::json!({"requests": [{"endpoint": "/a"}, {"endpoint": "/b"}]});
        let path: FieldPath = "requests.1.endpoint".parse().unwrap();
        assert_eq!(path.lookup(&tree), Some(&serde_json::json!("/b")));
        assert_eq!(FieldPath::root().lookup(&tree), Some(&tree));
        assert!("requests.5".parse::<FieldPath>().unwrap().lookup(&tree).is_none());
        assert!("requests.x".parse::<FieldPath>().unwrap().lookup(&tree).is_none());
    }

    #[test]
    fn path_serde_as_string() {
        let path: FieldPath = "requests[1].paginated".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"requests.1.paginated\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
