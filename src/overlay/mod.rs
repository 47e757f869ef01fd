//! Two-tier overlay resolution
//!
//! Every domain value type is stored twice over: global defaults, and
//! project-specific rows that override a default sharing the same natural key.
//! [`OverlayResolver`] performs the merge once per type; the result is an
//! immutable [`Overlay`] map that the expansion engine reads without further
//! store access.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::MissingReference;

/// Natural key of a domain value, unique within one overlay scope
pub trait NaturalKey {
    type Key: Ord + Clone + Debug;

    fn natural_key(&self) -> Self::Key;
}

/// Merges default and project rows by natural key
pub struct OverlayResolver<T, K> {
    key_fn: fn(&T) -> K,
}

impl<T: NaturalKey> OverlayResolver<T, T::Key> {
    /// Resolver keyed by the type's own [`NaturalKey`]
    pub fn by_natural_key() -> Self {
        Self {
            key_fn: T::natural_key,
        }
    }
}

impl<T, K: Ord> OverlayResolver<T, K> {
    pub fn new(key_fn: fn(&T) -> K) -> Self {
        Self { key_fn }
    }

    /// Insert every default, then every project row; project rows win on collision.
    pub fn resolve(
        &self,
        defaults: impl IntoIterator<Item = T>,
        project_rows: impl IntoIterator<Item = T>,
    ) -> Overlay<K, T> {
        let mut entries = BTreeMap::new();
        for row in defaults.into_iter().chain(project_rows) {
            entries.insert((self.key_fn)(&row), row);
        }
        Overlay { entries }
    }
}

/// Result of a lookup against an overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a, T> {
    Found(&'a T),
    Missing,
}

impl<'a, T> Lookup<'a, T> {
    /// Required reference: a miss becomes a [`MissingReference`].
    pub fn required(self, kind: &'static str, key: &str) -> Result<&'a T, MissingReference> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::Missing => Err(MissingReference {
                kind,
                key: key.to_string(),
            }),
        }
    }

    /// Optional reference: a miss degrades to `None`.
    pub fn optional(self) -> Option<&'a T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Missing => None,
        }
    }
}

/// Merged view of one domain value type
#[derive(Debug, Clone)]
pub struct Overlay<K, T> {
    entries: BTreeMap<K, T>,
}

impl<K: Ord, T> Default for Overlay<K, T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord, T> Overlay<K, T> {
    pub fn get<Q>(&self, key: &Q) -> Lookup<'_, T>
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.entries.get(key) {
            Some(value) => Lookup::Found(value),
            None => Lookup::Missing,
        }
    }

    /// Values in natural-key order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
