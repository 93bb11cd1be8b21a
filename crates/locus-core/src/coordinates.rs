//! Coordinates — the caller's logical location.
//!
//! A coordinate set is a small map of name/value pairs describing the
//! deployment context a configuration request is made from, e.g.
//! `{environment=test, region=west}`. Providers shape their answers with
//! coordinate sets of their own; the resolver compares the two entry-wise.
//!
//! The textual form `{k=v,k=v}` is both the [`Display`] output and the
//! input accepted by [`Coordinates::parse`]. It is the canonical wire
//! syntax for the reserved `configurationCoordinates` property.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A finite set of name/value pairs identifying a context.
///
/// Keys are unique; iteration order is the keys' sorted order, which makes
/// the [`Display`] form stable. Two coordinate sets are equal when they
/// hold exactly the same entries.
///
/// # Example
///
/// ```
/// use locus_core::Coordinates;
///
/// let caller = Coordinates::from([("environment", "test"), ("region", "west")]);
/// let value = Coordinates::from([("environment", "test")]);
///
/// assert!(value.is_subset_of(&caller));
/// assert_eq!(value.to_string(), "{environment=test}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coordinates(BTreeMap<String, String>);

impl Coordinates {
    /// Creates an empty coordinate set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds an entry, replacing any previous value for the same key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns `true` if every entry of `self` appears, with the same
    /// value, in `other`.
    ///
    /// The empty set is a subset of everything, including itself.
    #[must_use]
    pub fn is_subset_of(&self, other: &Coordinates) -> bool {
        self.0
            .iter()
            .all(|(k, v)| other.0.get(k).is_some_and(|ov| ov == v))
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses the `{k=v,k=v}` syntax.
    ///
    /// Surrounding braces are optional, whitespace around keys and values
    /// is trimmed, and the empty string (or bare `{}`) parses to the empty
    /// set. An entry without `=`, or with an empty key, is an error.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatesParseError`] naming the offending entry.
    pub fn parse(input: &str) -> Result<Self, CoordinatesParseError> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(trimmed);

        let mut coordinates = Coordinates::new();
        for entry in body.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| CoordinatesParseError::new(entry))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(CoordinatesParseError::new(entry));
            }
            coordinates.0.insert(key.to_string(), value.trim().to_string());
        }
        Ok(coordinates)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Coordinates {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Coordinates {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl IntoIterator for Coordinates {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A coordinate entry that did not match `key=value`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid coordinate entry '{entry}': expected key=value")]
pub struct CoordinatesParseError {
    entry: String,
}

impl CoordinatesParseError {
    fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
        }
    }
}
