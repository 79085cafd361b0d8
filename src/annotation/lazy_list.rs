//! Allocate-on-demand sequence used for every collection on metadata items.
//!
//! A `LazyList` starts without a backing vector. Reads always see a slice
//! (empty when nothing was written), mutation materializes the vector, and
//! replacing with `None` drops back to the unallocated state. Absence and
//! emptiness are indistinguishable to readers, including through `PartialEq`.
//!
//! Not internally synchronized: concurrent first writes to the same list need
//! external locking, like any other `&mut` access.

use std::fmt;

/// Optional sequence with "never absent, never silently dropped" semantics
#[derive(Clone)]
pub struct LazyList<T> {
    items: Option<Vec<T>>,
}

impl<T> LazyList<T> {
    /// Create an unmaterialized list.
    pub const fn new() -> Self {
        Self { items: None }
    }

    /// Items in insertion order; empty when the list was never written.
    pub fn as_slice(&self) -> &[T] {
        self.items.as_deref().unwrap_or(&[])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Materialize the backing vector (if needed) and return it for mutation.
    pub fn get_or_create(&mut self) -> &mut Vec<T> {
        self.items.get_or_insert_with(Vec::new)
    }

    pub fn push(&mut self, item: T) {
        self.get_or_create().push(item);
    }

    /// Replace the whole sequence. `None` resets to the lazy (empty) state.
    pub fn replace(&mut self, items: Option<Vec<T>>) {
        self.items = items;
    }

    /// Whether a backing vector has been allocated.
    pub fn is_materialized(&self) -> bool {
        self.items.is_some()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        match self.items.as_mut() {
            Some(items) => items.iter_mut(),
            None => std::slice::IterMut::default(),
        }
    }
}

impl<T> Default for LazyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq> PartialEq for LazyList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for LazyList<T> {}

impl<T> From<Vec<T>> for LazyList<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items: Some(items) }
    }
}

impl<T> FromIterator<T> for LazyList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: Some(iter.into_iter().collect()),
        }
    }
}

impl<'a, T> IntoIterator for &'a LazyList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
