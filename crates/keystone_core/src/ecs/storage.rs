//! # Component Storage
//!
//! Dense, handle-addressed component storage.
//!
//! The storage keeps live values packed:
//! - Values sit in a contiguous array, `[0, len)` is always fully live
//! - Removal swap-moves the last value into the hole
//! - The index map is rewritten for whichever value moved
//!
//! Renderers and physics read [`ComponentStorage::view`] once per frame
//! without any per-element handle indirection.

use std::convert::Infallible;

use super::generator::HandleGenerator;
use super::handle::Handle;
use super::index_map::IndexMap;
use crate::config::StorageConfig;
use crate::error::{fatal, StorageError, StorageResult};

/// Dense storage keyed by handles minted elsewhere.
///
/// This is the building block for per-entity component tables: the
/// owning entity's handle is the key, so at most one value exists per
/// handle.
#[derive(Debug, Clone)]
pub struct DenseStorage<T> {
    /// Live values, densely packed.
    values: Vec<T>,
    /// `handles[i]` owns `values[i]`.
    handles: Vec<Handle>,
    /// Handle to position in `values`.
    index: IndexMap<usize>,
}

impl<T> DenseStorage<T> {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates empty storage with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            handles: Vec::with_capacity(capacity),
            index: IndexMap::with_capacity(capacity),
        }
    }

    /// Stores a value under a handle.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NullHandle`] for the null handle
    /// - [`StorageError::HandleInUse`] if the handle already has a value
    pub fn insert(&mut self, handle: Handle, value: T) -> StorageResult<()> {
        if !handle.is_valid() {
            return Err(StorageError::NullHandle);
        }
        if self.index.contains(handle) {
            return Err(StorageError::HandleInUse(handle));
        }

        self.index.insert(handle, self.values.len());
        self.values.push(value);
        self.handles.push(handle);
        Ok(())
    }

    /// Removes the value for a handle.
    ///
    /// Returns `None` if the handle has no value. The last value is moved
    /// into the freed position, so positions of other values may change;
    /// their handles keep resolving to them.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let position = self.index.remove(handle)?;
        let last = self.values.len() - 1;

        if position != last {
            let moved = self.handles[last];
            if !self.index.relocate(moved, position) {
                fatal(StorageError::Desynchronized(format!(
                    "handle {moved} at position {last} has no index entry"
                )));
            }
            tracing::trace!(%moved, from = last, to = position, "compacted component");
        }

        self.handles.swap_remove(position);
        Some(self.values.swap_remove(position))
    }

    /// Checks whether a handle has a value.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.index.contains(handle)
    }

    /// Returns the current dense position of a handle's value.
    ///
    /// The position changes whenever another value is removed.
    #[inline]
    #[must_use]
    pub fn position_of(&self, handle: Handle) -> Option<usize> {
        self.index.get(handle)
    }

    /// Gets a value by handle.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let position = self.index.get(handle)?;
        Some(&self.values[position])
    }

    /// Gets a mutable value by handle.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let position = self.index.get(handle)?;
        Some(&mut self.values[position])
    }

    /// Returns the number of live values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no value is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns all live values as one contiguous slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Returns all live values as one contiguous mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Returns the owning handles, parallel to [`as_slice`](Self::as_slice).
    #[inline]
    #[must_use]
    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    /// Iterates over live values with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.handles.iter().copied().zip(self.values.iter())
    }

    /// Iterates mutably over live values with their handles.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.handles.iter().copied().zip(self.values.iter_mut())
    }

    /// Visits every live value in dense order.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(Handle, &T),
    {
        for (handle, value) in self.iter() {
            visit(handle, value);
        }
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        self.values.clear();
        self.handles.clear();
        self.index.clear();
    }

    /// Cross-checks the index map against the dense arrays.
    ///
    /// # Errors
    ///
    /// [`StorageError::Desynchronized`] describing the first disagreement.
    pub fn validate(&self) -> StorageResult<()> {
        if self.values.len() != self.handles.len() || self.index.len() != self.handles.len() {
            return Err(StorageError::Desynchronized(format!(
                "{} values, {} handles, {} index entries",
                self.values.len(),
                self.handles.len(),
                self.index.len()
            )));
        }
        for (position, handle) in self.handles.iter().enumerate() {
            if self.index.get(*handle) != Some(position) {
                return Err(StorageError::Desynchronized(format!(
                    "handle {handle} at position {position} indexed as {:?}",
                    self.index.get(*handle)
                )));
            }
        }
        Ok(())
    }
}

impl<T> Default for DenseStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Dense storage that mints its own handles.
///
/// This is the add/remove/lookup/iterate contract every component type
/// is stored behind.
///
/// # Example
///
/// ```rust
/// use keystone_core::ComponentStorage;
///
/// let mut lights: ComponentStorage<f32> = ComponentStorage::new();
/// let lamp = lights.add(0.8);
/// let torch = lights.add(0.3);
///
/// assert!(lights.remove(lamp));
/// assert!(!lights.remove(lamp));
/// assert_eq!(lights.get(torch), Some(&0.3));
/// assert_eq!(lights.view(), &[0.3]);
/// ```
#[derive(Debug, Clone)]
pub struct ComponentStorage<T> {
    dense: DenseStorage<T>,
    generator: HandleGenerator,
}

impl<T> ComponentStorage<T> {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates empty storage with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dense: DenseStorage::with_capacity(capacity),
            generator: HandleGenerator::new(),
        }
    }

    /// Creates empty storage sized from configuration.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::with_capacity(config.reserve)
    }

    /// Stores a value and returns its new handle.
    pub fn add(&mut self, value: T) -> Handle {
        self.add_tagged(0, 0, value)
    }

    /// Stores a value under a handle carrying `layer` and `flags`.
    pub fn add_tagged(&mut self, layer: u8, flags: u8, value: T) -> Handle {
        match self.try_add_tagged_with(layer, flags, || Ok::<_, Infallible>(value)) {
            Ok(handle) => handle,
            Err(never) => match never {},
        }
    }

    /// Stores the value produced by `make`.
    ///
    /// `make` runs before anything is claimed, so a failure leaves the
    /// storage and the handle sequence untouched.
    ///
    /// # Errors
    ///
    /// Whatever `make` returns.
    pub fn try_add_with<E, F>(&mut self, make: F) -> Result<Handle, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.try_add_tagged_with(0, 0, make)
    }

    fn try_add_tagged_with<E, F>(&mut self, layer: u8, flags: u8, make: F) -> Result<Handle, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let value = make()?;
        let handle = self.generator.generate_tagged(layer, flags);
        if let Err(err) = self.dense.insert(handle, value) {
            fatal(err);
        }
        Ok(handle)
    }

    /// Peeks at the handle the next [`add_tagged`](Self::add_tagged) with
    /// the same layer and flags returns.
    #[inline]
    #[must_use]
    pub fn peek_handle(&self, layer: u8, flags: u8) -> Handle {
        self.generator.current_tagged(layer, flags)
    }

    /// Removes a value.
    ///
    /// Returns `true` exactly once per live handle; removing an unknown
    /// or already removed handle returns `false`.
    pub fn remove(&mut self, handle: Handle) -> bool {
        self.take(handle).is_some()
    }

    /// Removes a value and hands it back.
    pub fn take(&mut self, handle: Handle) -> Option<T> {
        let value = self.dense.remove(handle)?;
        self.generator.retire(handle);
        Some(value)
    }

    /// Checks whether a handle is live.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.dense.contains(handle)
    }

    /// Gets a value by handle, `None` if it is not live.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.dense.get(handle)
    }

    /// Gets a mutable value by handle, `None` if it is not live.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.dense.get_mut(handle)
    }

    /// Returns every live value as one contiguous slice.
    #[inline]
    #[must_use]
    pub fn view(&self) -> &[T] {
        self.dense.as_slice()
    }

    /// Returns every live value as one contiguous mutable slice.
    #[inline]
    pub fn view_mut(&mut self) -> &mut [T] {
        self.dense.as_mut_slice()
    }

    /// Returns the live handles, parallel to [`view`](Self::view).
    #[inline]
    #[must_use]
    pub fn handles(&self) -> &[Handle] {
        self.dense.handles()
    }

    /// Iterates over live values with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.dense.iter()
    }

    /// Iterates mutably over live values with their handles.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.dense.iter_mut()
    }

    /// Visits every live value in dense order.
    pub fn for_each<F>(&self, visit: F)
    where
        F: FnMut(Handle, &T),
    {
        self.dense.for_each(visit);
    }

    /// Returns the number of live values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if no value is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Removes every value, retiring all handles.
    pub fn clear(&mut self) {
        for &handle in self.dense.handles() {
            self.generator.retire(handle);
        }
        self.dense.clear();
    }

    /// Cross-checks the index map against the dense arrays.
    ///
    /// # Errors
    ///
    /// [`StorageError::Desynchronized`] describing the first disagreement.
    pub fn validate(&self) -> StorageResult<()> {
        self.dense.validate()
    }
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}
