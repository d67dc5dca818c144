//! # Handle Generator
//!
//! Mints handles that are distinct from every handle minted before.

use std::collections::VecDeque;

use super::handle::Handle;
use crate::error::{fatal, StorageError};

/// Issues unique [`Handle`] values.
///
/// Fresh indices come from a counter starting at `1`. Retired handles
/// are reissued first-in first-out with their version bumped, so the
/// index is reused but the raw handle value never is.
///
/// # Example
///
/// ```rust
/// use keystone_core::HandleGenerator;
///
/// let mut generator = HandleGenerator::new();
/// let expected = generator.current();
/// let handle = generator.generate();
/// assert_eq!(handle, expected);
/// assert_eq!(handle.index(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct HandleGenerator {
    /// Next never-issued index, `None` once every index has been issued.
    next_index: Option<u32>,
    /// Handles waiting for their index to be reissued.
    retired: VecDeque<Handle>,
}

impl HandleGenerator {
    /// Creates a generator whose first handle has index `1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_index: Some(1),
            retired: VecDeque::new(),
        }
    }

    /// Mints the next handle with zero layer and flags.
    #[inline]
    pub fn generate(&mut self) -> Handle {
        self.generate_tagged(0, 0)
    }

    /// Mints the next handle with the given layer and flags.
    ///
    /// # Panics
    ///
    /// Panics once all `u32` indices have been issued and none is
    /// available for reuse.
    pub fn generate_tagged(&mut self, layer: u8, flags: u8) -> Handle {
        if let Some(retired) = self.retired.pop_front() {
            let handle = retired.recycle(layer, flags);
            tracing::trace!(%retired, %handle, "recycling handle index");
            return handle;
        }

        let Some(index) = self.next_index else {
            fatal(StorageError::Desynchronized(
                "handle index space exhausted".to_string(),
            ));
        };
        self.next_index = index.checked_add(1);
        Handle::join(index, 0, layer, flags)
    }

    /// Peeks at the handle the next [`generate`](Self::generate) call returns.
    #[inline]
    #[must_use]
    pub fn current(&self) -> Handle {
        self.current_tagged(0, 0)
    }

    /// Peeks at the handle the next [`generate_tagged`](Self::generate_tagged)
    /// call with the same layer and flags returns.
    ///
    /// Returns [`Handle::NULL`] once the index space is exhausted.
    #[must_use]
    pub fn current_tagged(&self, layer: u8, flags: u8) -> Handle {
        match self.retired.front() {
            Some(retired) => retired.recycle(layer, flags),
            None => self
                .next_index
                .map_or(Handle::NULL, |index| Handle::join(index, 0, layer, flags)),
        }
    }

    /// Hands a removed handle back so its index can be reissued.
    ///
    /// An index whose version is already at the maximum is dropped for
    /// good, since bumping it would wrap onto a value issued before.
    pub fn retire(&mut self, handle: Handle) {
        if !handle.is_valid() {
            return;
        }
        if handle.version() == u16::MAX {
            tracing::trace!(%handle, "index versions exhausted, retiring permanently");
            return;
        }
        self.retired.push_back(handle);
    }

    /// Number of indices waiting to be reissued.
    #[inline]
    #[must_use]
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    /// Number of distinct indices handed out so far.
    #[inline]
    #[must_use]
    pub const fn indices_issued(&self) -> u32 {
        match self.next_index {
            Some(index) => index - 1,
            None => u32::MAX,
        }
    }
}

impl Default for HandleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_starts_at_one() {
        let mut generator = HandleGenerator::new();
        let first = generator.generate();
        assert_eq!(first.index(), 1);
        assert_eq!(first.version(), 0);
        assert!(first.is_valid());
    }

    #[test]
    fn test_current_does_not_consume() {
        let mut generator = HandleGenerator::new();
        let peeked = generator.current();
        assert_eq!(generator.current(), peeked);
        assert_eq!(generator.generate(), peeked);
        assert_ne!(generator.current(), peeked);
    }

    #[test]
    fn test_current_tagged_matches_generate_tagged() {
        let mut generator = HandleGenerator::new();
        let a = generator.generate();
        generator.retire(a);

        let expected = generator.current_tagged(3, 0x80);
        let actual = generator.generate_tagged(3, 0x80);
        assert_eq!(expected, actual);
        assert_eq!(actual.layer(), 3);
        assert_eq!(actual.flags(), 0x80);
    }

    #[test]
    fn test_retired_index_comes_back_with_new_version() {
        let mut generator = HandleGenerator::new();
        let a = generator.generate();
        let _b = generator.generate();

        generator.retire(a);
        let c = generator.generate();

        assert_eq!(c.index(), a.index());
        assert_eq!(c.version(), a.version() + 1);
        assert_ne!(c, a);
    }

    #[test]
    fn test_retired_indices_reissued_fifo() {
        let mut generator = HandleGenerator::new();
        let a = generator.generate();
        let b = generator.generate();

        generator.retire(b);
        generator.retire(a);

        assert_eq!(generator.generate().index(), b.index());
        assert_eq!(generator.generate().index(), a.index());
        assert_eq!(generator.generate().index(), 3);
    }

    #[test]
    fn test_exhausted_version_is_not_reissued() {
        let mut generator = HandleGenerator::new();
        let worn = Handle::join(1, u16::MAX, 0, 0);

        generator.retire(worn);
        assert_eq!(generator.retired_count(), 0);

        generator.retire(Handle::NULL);
        assert_eq!(generator.retired_count(), 0);
    }

    #[test]
    fn test_handles_unique_under_churn() {
        let mut generator = HandleGenerator::new();
        let mut seen = HashSet::new();
        let mut live = Vec::new();

        for round in 0..1_000 {
            let handle = generator.generate();
            assert!(seen.insert(handle), "handle {handle} issued twice");
            live.push(handle);
            if round % 3 == 0 {
                generator.retire(live.remove(0));
            }
        }
        assert!(generator.indices_issued() < 1_000);
    }

    #[test]
    fn test_last_index_is_issued() {
        let mut generator = HandleGenerator::new();
        generator.next_index = Some(u32::MAX);

        assert_eq!(generator.current().index(), u32::MAX);
        let last = generator.generate();
        assert_eq!(last.index(), u32::MAX);
        assert_eq!(generator.indices_issued(), u32::MAX);
        assert_eq!(generator.current(), Handle::NULL);

        // Retired indices still come back after exhaustion.
        generator.retire(last);
        assert_eq!(generator.generate(), last.with_version(1));
    }

    #[test]
    #[should_panic(expected = "storage invariant violated")]
    fn test_index_exhaustion_is_fatal() {
        let mut generator = HandleGenerator::new();
        generator.next_index = Some(u32::MAX);
        let _ = generator.generate();
        let _ = generator.generate();
    }
}
