//! # Block Storage
//!
//! Handle-addressed storage that grows by appending fixed-capacity blocks.
//!
//! Unlike [`ComponentStorage`](super::ComponentStorage), values never move
//! once placed: removal frees the slot in its block instead of
//! compacting. Iteration walks blocks in order and skips freed slots.

use std::convert::Infallible;

use super::generator::HandleGenerator;
use super::handle::Handle;
use super::index_map::IndexMap;
use crate::config::StorageConfig;
use crate::error::{fatal, StorageError};
use crate::memory::Block;

/// Physical location of a value inside a [`BlockStorage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotLocation {
    /// Index of the block.
    pub block: usize,
    /// Position inside the block.
    pub position: usize,
}

/// Storage backed by a growable list of [`Block`]s.
///
/// # Example
///
/// ```rust
/// use keystone_core::BlockStorage;
///
/// let mut colliders: BlockStorage<[f32; 3]> = BlockStorage::new(2);
/// let a = colliders.add([1.0, 1.0, 1.0]);
/// let _b = colliders.add([2.0, 2.0, 2.0]);
/// let _c = colliders.add([3.0, 3.0, 3.0]); // appends a second block
///
/// assert_eq!(colliders.block_count(), 2);
/// assert!(colliders.remove(a));
/// assert_eq!(colliders.get(a), None);
/// ```
#[derive(Debug)]
pub struct BlockStorage<T> {
    blocks: Vec<Block<T>>,
    /// Blocks with at least one claimable slot, most recent last.
    open: Vec<usize>,
    index: IndexMap<SlotLocation>,
    generator: HandleGenerator,
    block_capacity: usize,
}

impl<T> BlockStorage<T> {
    /// Creates empty storage whose blocks hold `block_capacity` values.
    ///
    /// No block is allocated until the first add.
    ///
    /// # Panics
    ///
    /// Panics if `block_capacity` is zero.
    #[must_use]
    pub fn new(block_capacity: usize) -> Self {
        assert!(block_capacity > 0, "Block capacity must be greater than zero");
        Self {
            blocks: Vec::new(),
            open: Vec::new(),
            index: IndexMap::new(),
            generator: HandleGenerator::new(),
            block_capacity,
        }
    }

    /// Creates storage from configuration, preallocating blocks if asked.
    ///
    /// # Panics
    ///
    /// Panics if the configured block capacity is zero; run
    /// [`StorageConfig::validate`] first.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        let mut storage = Self::new(config.block_capacity);
        for _ in 0..config.preallocate_blocks {
            storage.grow();
        }
        storage
    }

    /// Stores a value and returns its new handle.
    pub fn add(&mut self, value: T) -> Handle {
        match self.try_add_with(|| Ok::<_, Infallible>(value)) {
            Ok(handle) => handle,
            Err(never) => match never {},
        }
    }

    /// Claims a slot, then stores the value produced by `make`.
    ///
    /// If `make` fails the claim is rolled back and no handle is used.
    ///
    /// # Errors
    ///
    /// Whatever `make` returns.
    pub fn try_add_with<E, F>(&mut self, make: F) -> Result<Handle, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let location = self.claim();

        let value = match make() {
            Ok(value) => value,
            Err(err) => {
                if let Err(release) = self.blocks[location.block].release(location.position) {
                    fatal(release);
                }
                if !self.open.contains(&location.block) {
                    self.open.push(location.block);
                }
                return Err(err);
            }
        };

        if let Err(err) = self.blocks[location.block].emplace(location.position, value) {
            fatal(err);
        }
        let handle = self.generator.generate();
        self.index.insert(handle, location);
        Ok(handle)
    }

    /// Peeks at the handle the next add returns.
    #[inline]
    #[must_use]
    pub fn peek_handle(&self) -> Handle {
        self.generator.current()
    }

    /// Removes a value; `false` if the handle is not live.
    pub fn remove(&mut self, handle: Handle) -> bool {
        self.take(handle).is_some()
    }

    /// Removes a value and hands it back.
    pub fn take(&mut self, handle: Handle) -> Option<T> {
        let location = self.index.remove(handle)?;
        let block = &mut self.blocks[location.block];
        let was_full = block.is_full();

        let value = block
            .free(location.position)
            .unwrap_or_else(|err| fatal(err));
        if was_full {
            self.open.push(location.block);
        }
        self.generator.retire(handle);
        Some(value)
    }

    /// Checks whether a handle is live.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.index.contains(handle)
    }

    /// Returns where a handle's value lives.
    #[inline]
    #[must_use]
    pub fn location_of(&self, handle: Handle) -> Option<SlotLocation> {
        self.index.get(handle)
    }

    /// Gets a value by handle, `None` if it is not live.
    ///
    /// # Panics
    ///
    /// Panics if the index map points at a freed slot.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let location = self.index.get(handle)?;
        match self.blocks[location.block].get(location.position) {
            Ok(value) => Some(value),
            Err(err) => fatal(err),
        }
    }

    /// Gets a mutable value by handle, `None` if it is not live.
    ///
    /// # Panics
    ///
    /// Panics if the index map points at a freed slot.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let location = self.index.get(handle)?;
        match self.blocks[location.block].get_mut(location.position) {
            Ok(value) => Some(value),
            Err(err) => fatal(err),
        }
    }

    /// Visits every live value, block by block in physical order.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&T),
    {
        for block in &self.blocks {
            block.for_each(&mut visit);
        }
    }

    /// Visits every live value mutably, block by block in physical order.
    pub fn for_each_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut T),
    {
        for block in &mut self.blocks {
            block.for_each_mut(&mut visit);
        }
    }

    /// Iterates over live values with their locations.
    pub fn iter(&self) -> impl Iterator<Item = (SlotLocation, &T)> {
        self.blocks.iter().enumerate().flat_map(|(block, slots)| {
            slots
                .iter()
                .map(move |(position, value)| (SlotLocation { block, position }, value))
        })
    }

    /// Returns the number of live values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no value is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the number of allocated blocks.
    #[inline]
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the capacity of each block.
    #[inline]
    #[must_use]
    pub const fn block_capacity(&self) -> usize {
        self.block_capacity
    }

    /// Returns the total slot capacity across all blocks.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.blocks.len() * self.block_capacity
    }

    /// Finds a free slot, appending a block when every block is full.
    fn claim(&mut self) -> SlotLocation {
        while let Some(&block) = self.open.last() {
            match self.blocks[block].alloc() {
                Ok(position) => {
                    if self.blocks[block].is_full() {
                        self.open.pop();
                    }
                    return SlotLocation { block, position };
                }
                Err(StorageError::CapacityExceeded { .. }) => {
                    self.open.pop();
                }
                Err(err) => fatal(err),
            }
        }

        let block = self.grow();
        match self.blocks[block].alloc() {
            Ok(position) => {
                if self.blocks[block].is_full() {
                    self.open.pop();
                }
                SlotLocation { block, position }
            }
            Err(err) => fatal(err),
        }
    }

    fn grow(&mut self) -> usize {
        let block = self.blocks.len();
        self.blocks.push(Block::new(self.block_capacity));
        self.open.push(block);
        tracing::debug!(
            blocks = self.blocks.len(),
            block_capacity = self.block_capacity,
            "appended storage block"
        );
        block
    }
}
