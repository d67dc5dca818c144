//! # Slot Block
//!
//! Fixed-capacity slot allocator with a free-list, the unit of growth for
//! block-backed storage.

use crate::error::{StorageError, StorageResult};

/// A fixed-capacity array of slots plus a LIFO free-list.
///
/// Each slot is tagged: `None` means the memory is invalid (never
/// constructed, or freed), `Some` means it holds a live value. Every read
/// checks the tag, so a desynchronized caller gets
/// [`StorageError::UseOfFreedSlot`] instead of stale data.
///
/// A block never grows. When [`alloc`](Self::alloc) reports
/// [`StorageError::CapacityExceeded`] the owner appends another block.
///
/// # Thread Safety
///
/// This block is NOT thread-safe. It is owned by a single storage container.
///
/// # Example
///
/// ```rust
/// use keystone_core::Block;
///
/// let mut block: Block<u32> = Block::new(2);
///
/// let position = block.alloc()?;
/// block.emplace(position, 42)?;
/// assert_eq!(*block.get(position)?, 42);
///
/// assert_eq!(block.free(position)?, 42);
/// # Ok::<(), keystone_core::StorageError>(())
/// ```
#[derive(Debug)]
pub struct Block<T> {
    /// Tagged slot storage.
    slots: Box<[Option<T>]>,
    /// Positions handed out by `alloc` and not yet filled or released.
    claimed: Box<[bool]>,
    /// Freed positions below the high-water mark, reused LIFO.
    free_list: Vec<usize>,
    /// One past the highest position ever handed out and not trimmed.
    mark: usize,
    /// Number of live values.
    live: usize,
}

impl<T> Block<T> {
    /// Creates a block with the specified capacity.
    ///
    /// All slot memory is reserved upfront and tagged invalid.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        let slots: Vec<Option<T>> = (0..capacity).map(|_| None).collect();

        Self {
            slots: slots.into_boxed_slice(),
            claimed: vec![false; capacity].into_boxed_slice(),
            free_list: Vec::new(),
            mark: 0,
            live: 0,
        }
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of live values.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no value is live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns one past the highest position in use.
    #[inline]
    #[must_use]
    pub const fn high_water_mark(&self) -> usize {
        self.mark
    }

    /// Returns the number of freed positions waiting for reuse.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Returns `true` if neither a freed position nor untouched capacity remains.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free_list.is_empty() && self.mark == self.capacity()
    }

    /// Claims a position.
    ///
    /// Freed positions are reused first (most recently freed first), then
    /// the high-water mark advances. The slot stays tagged invalid until
    /// [`emplace`](Self::emplace) fills it.
    ///
    /// # Errors
    ///
    /// [`StorageError::CapacityExceeded`] when the block is full.
    pub fn alloc(&mut self) -> StorageResult<usize> {
        let position = if let Some(position) = self.free_list.pop() {
            position
        } else if self.mark < self.capacity() {
            self.mark += 1;
            self.mark - 1
        } else {
            return Err(StorageError::CapacityExceeded {
                capacity: self.capacity(),
            });
        };
        self.claimed[position] = true;
        Ok(position)
    }

    /// Constructs a value into a claimed position.
    ///
    /// # Errors
    ///
    /// - [`StorageError::SlotOutOfRange`] past the high-water mark
    /// - [`StorageError::SlotOccupied`] if the slot already holds a value
    /// - [`StorageError::UseOfFreedSlot`] if the position is not claimed
    pub fn emplace(&mut self, position: usize, value: T) -> StorageResult<()> {
        self.check_claimed(position)?;
        self.claimed[position] = false;
        self.slots[position] = Some(value);
        self.live += 1;
        Ok(())
    }

    /// Gives back a claimed position that was never filled.
    ///
    /// Used to roll back [`alloc`](Self::alloc) when constructing the
    /// value failed.
    ///
    /// # Errors
    ///
    /// - [`StorageError::SlotOutOfRange`] past the high-water mark
    /// - [`StorageError::SlotOccupied`] if the slot holds a live value
    /// - [`StorageError::UseOfFreedSlot`] if the position is not claimed,
    ///   such as one already back on the free-list
    pub fn release(&mut self, position: usize) -> StorageResult<()> {
        self.check_claimed(position)?;
        self.claimed[position] = false;
        self.reclaim(position);
        Ok(())
    }

    /// Frees a live slot and returns its value.
    ///
    /// Freeing the topmost position lowers the high-water mark, anything
    /// below it goes onto the free-list.
    ///
    /// # Errors
    ///
    /// - [`StorageError::SlotOutOfRange`] if the position was never claimed
    /// - [`StorageError::UseOfFreedSlot`] if the slot is already free
    pub fn free(&mut self, position: usize) -> StorageResult<T> {
        let value = self
            .slot_mut(position)?
            .take()
            .ok_or(StorageError::UseOfFreedSlot { position })?;
        self.live -= 1;
        self.reclaim(position);
        Ok(value)
    }

    /// Gets a reference to a live value.
    ///
    /// # Errors
    ///
    /// - [`StorageError::SlotOutOfRange`] past the high-water mark
    /// - [`StorageError::UseOfFreedSlot`] if the slot is free
    #[inline]
    pub fn get(&self, position: usize) -> StorageResult<&T> {
        if position >= self.mark {
            return Err(StorageError::SlotOutOfRange {
                position,
                limit: self.mark,
            });
        }
        self.slots[position]
            .as_ref()
            .ok_or(StorageError::UseOfFreedSlot { position })
    }

    /// Gets a mutable reference to a live value.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    #[inline]
    pub fn get_mut(&mut self, position: usize) -> StorageResult<&mut T> {
        self.slot_mut(position)?
            .as_mut()
            .ok_or(StorageError::UseOfFreedSlot { position })
    }

    /// Visits every live value in physical order.
    ///
    /// The block cannot be modified from inside the visitor.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&T),
    {
        for value in self.slots[..self.mark].iter().flatten() {
            visit(value);
        }
    }

    /// Visits every live value mutably in physical order.
    pub fn for_each_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut T),
    {
        for value in self.slots[..self.mark].iter_mut().flatten() {
            visit(value);
        }
    }

    /// Iterates over live values with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots[..self.mark]
            .iter()
            .enumerate()
            .filter_map(|(position, slot)| slot.as_ref().map(|value| (position, value)))
    }

    /// Drops every value and resets the block.
    ///
    /// Slot memory is kept for reuse.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.claimed.fill(false);
        self.free_list.clear();
        self.mark = 0;
        self.live = 0;
    }

    fn slot_mut(&mut self, position: usize) -> StorageResult<&mut Option<T>> {
        let limit = self.mark;
        if position >= limit {
            return Err(StorageError::SlotOutOfRange { position, limit });
        }
        Ok(&mut self.slots[position])
    }

    /// Checks that a position is claimed and still empty.
    fn check_claimed(&mut self, position: usize) -> StorageResult<()> {
        if self.slot_mut(position)?.is_some() {
            return Err(StorageError::SlotOccupied { position });
        }
        if !self.claimed[position] {
            return Err(StorageError::UseOfFreedSlot { position });
        }
        Ok(())
    }

    fn reclaim(&mut self, position: usize) {
        if position + 1 == self.mark {
            self.mark -= 1;
        } else {
            self.free_list.push(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, count: usize) -> Block<u32> {
        let mut block = Block::new(capacity);
        for value in 0..count {
            let position = block.alloc().unwrap();
            block.emplace(position, value as u32).unwrap();
        }
        block
    }

    #[test]
    fn test_alloc_advances_mark() {
        let mut block: Block<u32> = Block::new(4);
        assert_eq!(block.alloc().unwrap(), 0);
        assert_eq!(block.alloc().unwrap(), 1);
        assert_eq!(block.high_water_mark(), 2);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut block = filled(2, 2);
        assert!(block.is_full());
        assert_eq!(
            block.alloc(),
            Err(StorageError::CapacityExceeded { capacity: 2 })
        );
    }

    #[test]
    fn test_free_top_lowers_mark() {
        let mut block = filled(4, 3);
        assert_eq!(block.free(2).unwrap(), 2);
        assert_eq!(block.high_water_mark(), 2);
        assert_eq!(block.free_count(), 0);
        assert_eq!(block.alloc().unwrap(), 2);
    }

    #[test]
    fn test_free_below_top_uses_free_list() {
        let mut block = filled(4, 3);
        assert_eq!(block.free(0).unwrap(), 0);
        assert_eq!(block.high_water_mark(), 3);
        assert_eq!(block.free_count(), 1);

        // Freed positions are reused before the mark advances.
        assert_eq!(block.alloc().unwrap(), 0);
        assert_eq!(block.alloc().unwrap(), 3);
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut block = filled(5, 4);
        block.free(0).unwrap();
        block.free(1).unwrap();
        assert_eq!(block.alloc().unwrap(), 1);
        assert_eq!(block.alloc().unwrap(), 0);
    }

    #[test]
    fn test_full_block_with_free_list_is_not_full() {
        let mut block = filled(2, 2);
        block.free(0).unwrap();
        assert!(!block.is_full());
    }

    #[test]
    fn test_use_of_freed_slot() {
        let mut block = filled(4, 3);
        block.free(1).unwrap();

        assert_eq!(block.get(1), Err(StorageError::UseOfFreedSlot { position: 1 }));
        assert_eq!(block.free(1), Err(StorageError::UseOfFreedSlot { position: 1 }));
    }

    #[test]
    fn test_out_of_range() {
        let block = filled(4, 1);
        assert_eq!(
            block.get(3),
            Err(StorageError::SlotOutOfRange { position: 3, limit: 1 })
        );
    }

    #[test]
    fn test_emplace_twice_rejected() {
        let mut block = filled(2, 1);
        assert_eq!(block.emplace(0, 9), Err(StorageError::SlotOccupied { position: 0 }));
    }

    #[test]
    fn test_release_rolls_back_claim() {
        let mut block: Block<u32> = Block::new(2);
        let position = block.alloc().unwrap();
        block.release(position).unwrap();

        assert_eq!(block.high_water_mark(), 0);
        assert!(block.is_empty());
        assert_eq!(block.alloc().unwrap(), position);
    }

    #[test]
    fn test_release_of_freed_position_rejected() {
        let mut block = filled(4, 3);
        block.free(0).unwrap();

        assert_eq!(block.release(0), Err(StorageError::UseOfFreedSlot { position: 0 }));
        assert_eq!(block.free_count(), 1);
        assert_eq!(block.alloc().unwrap(), 0);
        assert_eq!(block.alloc().unwrap(), 3);
    }

    #[test]
    fn test_release_twice_rejected() {
        let mut block: Block<u32> = Block::new(4);
        let first = block.alloc().unwrap();
        let second = block.alloc().unwrap();
        block.release(first).unwrap();

        assert_eq!(block.release(first), Err(StorageError::UseOfFreedSlot { position: first }));
        assert_eq!(block.free_count(), 1);
        block.emplace(second, 5).unwrap();
        assert_eq!(block.release(second), Err(StorageError::SlotOccupied { position: second }));
    }

    #[test]
    fn test_emplace_into_unclaimed_position_rejected() {
        let mut block = filled(4, 2);
        block.free(0).unwrap();
        assert_eq!(block.emplace(0, 9), Err(StorageError::UseOfFreedSlot { position: 0 }));
    }

    #[test]
    fn test_for_each_skips_freed() {
        let mut block = filled(4, 4);
        block.free(1).unwrap();

        let mut seen = Vec::new();
        block.for_each(|value| seen.push(*value));
        assert_eq!(seen, vec![0, 2, 3]);

        block.for_each_mut(|value| *value *= 10);
        let collected: Vec<_> = block.iter().collect();
        assert_eq!(collected, vec![(0, &0), (2, &20), (3, &30)]);
    }

    #[test]
    fn test_clear() {
        let mut block = filled(3, 3);
        block.clear();
        assert!(block.is_empty());
        assert_eq!(block.high_water_mark(), 0);
        assert_eq!(block.alloc().unwrap(), 0);
    }
}
