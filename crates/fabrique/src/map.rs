//! An insertion-ordered map that remembers where each value was defined,
//! so that redefining a name can be reported with both locations.

use std::{hash::Hash, marker::PhantomData};

use indexmap::{Equivalent, IndexMap};

use crate::diagnostics::{ErrorReport, ErrorReporter, SourceRange};

/// Values stored in a [`NamedMap`] must be able to report where they were
/// defined.
pub trait Located {
    fn location(&self) -> &SourceRange;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry<V> {
    value: V,
    range: SourceRange,
    marker: PhantomData<()>,
}

/// An `IndexMap` wrapper tracking definition sites, used for record fields,
/// scope bindings, rule/build/target names — anywhere two definitions under
/// the same name is a semantic error rather than a silent overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedMap<K: Hash + Eq, V: Located> {
    map: IndexMap<K, Entry<V>>,
}

impl<K: Hash + Eq, V: Located> Default for NamedMap<K, V> {
    fn default() -> Self {
        Self { map: IndexMap::new() }
    }
}

impl<K, V> NamedMap<K, V>
where
    K: Hash + Eq,
    V: Located,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts unconditionally, returning the previous value if the key
    /// already existed. Used where shadowing is legal (nested scopes).
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let range = value.location().clone();
        self.map.insert(key, Entry { value, range, marker: PhantomData }).map(|e| e.value)
    }

    /// Inserts, reporting (not failing) a redefinition error through
    /// `reporter` if the key was already bound. Returns `false` if the
    /// insert was rejected because of a collision.
    pub fn insert_unique(&mut self, key: K, value: V, reporter: &mut ErrorReporter) -> bool
    where
        K: Clone + std::fmt::Display,
    {
        let range = value.location().clone();
        match self.map.get(&key) {
            Some(existing) => {
                reporter.report(ErrorReport::error(format!("'{key}' is already defined"), range.clone()));
                reporter.report(ErrorReport::note(format!("'{key}' was first defined here"), existing.range.clone()));
                false
            }
            None => {
                self.map.insert(key, Entry { value, range, marker: PhantomData });
                true
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.map.get(key).map(|e| &e.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.map.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.map.values().map(|e| &e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter().map(|(k, e)| (k, &e.value))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
