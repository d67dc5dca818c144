//! # Index Map
//!
//! Translates a handle into the current physical location of its value.

use std::collections::HashMap;

use super::handle::Handle;

/// Map from live [`Handle`] to storage location.
///
/// Holds exactly one entry per live handle. An entry is rewritten with
/// [`relocate`](Self::relocate) when compaction moves a value and erased
/// only when the value itself is removed.
#[derive(Debug, Clone)]
pub struct IndexMap<L> {
    entries: HashMap<Handle, L>,
}

impl<L: Copy> IndexMap<L> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Creates an empty map with room for `capacity` handles.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Records a location for a handle, returning the previous one.
    #[inline]
    pub fn insert(&mut self, handle: Handle, location: L) -> Option<L> {
        self.entries.insert(handle, location)
    }

    /// Looks up the location of a handle.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<L> {
        self.entries.get(&handle).copied()
    }

    /// Checks whether a handle has an entry.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Points an existing entry at a new location.
    ///
    /// Returns `false` without inserting if the handle has no entry.
    #[inline]
    pub fn relocate(&mut self, handle: Handle, location: L) -> bool {
        match self.entries.get_mut(&handle) {
            Some(entry) => {
                *entry = location;
                true
            }
            None => false,
        }
    }

    /// Erases the entry for a handle, returning its location.
    #[inline]
    pub fn remove(&mut self, handle: Handle) -> Option<L> {
        self.entries.remove(&handle)
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, L)> + '_ {
        self.entries.iter().map(|(handle, location)| (*handle, *location))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<L: Copy> Default for IndexMap<L> {
    fn default() -> Self {
        Self::new()
    }
}
