//! Composite names

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hierarchical, path-like name made of string segments
///
/// Two names are equal when their segments are equal element-wise. On the
/// wire a name is a plain JSON array of strings.
///
/// # Example
///
/// ```
/// use modelrun_core::CompositeName;
///
/// let name = CompositeName::from(["actions", "noop"]);
/// assert_eq!(name.len(), 2);
/// assert_eq!(name.to_string(), "actions/noop");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeName(Vec<String>);

impl CompositeName {
    /// Create a name from its segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The empty name, which addresses the root context
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Name used for notifications that belong to no run
    pub fn null() -> Self {
        Self::from([CONSTANT, NULL])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment, if any
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Return a new name with `segment` appended
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Check if `self` is a (non-strict) prefix of `other`
    pub fn is_prefix_of(&self, other: &CompositeName) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Split into the parent name and the last segment
    pub fn split_last(&self) -> Option<(CompositeName, &str)> {
        let (last, parent) = self.0.split_last()?;
        Some((CompositeName(parent.to_vec()), last.as_str()))
    }
}

/// Segment of the well-known constant namespace
pub const CONSTANT: &str = "constant";

/// Segment for the null constant
pub const NULL: &str = "null";

impl fmt::Display for CompositeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl<const N: usize> From<[&str; N]> for CompositeName {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl From<Vec<String>> for CompositeName {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl<S: Into<String>> FromIterator<S> for CompositeName {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_element_wise() {
        assert_eq!(
            CompositeName::from(["gui", "1"]),
            CompositeName::new(vec!["gui".to_string(), "1".to_string()])
        );
        assert_ne!(
            CompositeName::from(["gui", "1"]),
            CompositeName::from(["gui", "2"])
        );
        assert_ne!(CompositeName::from(["gui"]), CompositeName::from(["gui", "1"]));
    }

    #[test]
    fn test_prefix_and_split() {
        let parent = CompositeName::from(["model_run"]);
        let child = parent.child("abc");

        assert!(parent.is_prefix_of(&child));
        assert!(CompositeName::root().is_prefix_of(&child));
        assert!(!child.is_prefix_of(&parent));

        let (split_parent, last) = child.split_last().unwrap();
        assert_eq!(split_parent, parent);
        assert_eq!(last, "abc");
        assert!(CompositeName::root().split_last().is_none());
    }

    #[test]
    fn test_serializes_as_array() {
        let name = CompositeName::from(["ctx", "1"]);
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, r#"["ctx","1"]"#);

        let parsed: CompositeName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn test_null_name() {
        assert_eq!(CompositeName::null().to_string(), "constant/null");
    }
}
