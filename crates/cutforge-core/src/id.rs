//! Constraint identifiers and categories.

use std::borrow::Borrow;
use std::fmt;

/// Opaque identifier of one candidate lazy constraint or cut.
///
/// Identifiers are compared byte-wise, so sorting a set of identifiers
/// always yields the same order regardless of how they were collected.
///
/// # Examples
///
/// ```
/// use cutforge_core::ConstraintId;
///
/// let mut ids = vec![ConstraintId::from("c10"), ConstraintId::from("c1"), ConstraintId::from("b")];
/// ids.sort();
/// assert_eq!(ids, vec!["b".into(), "c1".into(), "c10".into()]);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(Vec<u8>);

impl ConstraintId {
    /// Creates an identifier from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the canonical byte form.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the text form, if the bytes are valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Consumes the identifier, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => write!(f, "ConstraintId({text:?})"),
            None => write!(f, "ConstraintId({:?})", self.0),
        }
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for ConstraintId {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for ConstraintId {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&[u8]> for ConstraintId {
    fn from(b: &[u8]) -> Self {
        Self(b.to_vec())
    }
}

impl From<Vec<u8>> for ConstraintId {
    fn from(b: Vec<u8>) -> Self {
        Self(b)
    }
}

impl Borrow<[u8]> for ConstraintId {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

/// Grouping key of constraints that share one learned model
/// (typically a constraint-family name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Self(s)
    }
}
