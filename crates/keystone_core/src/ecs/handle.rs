//! # Handles
//!
//! Handles are lightweight identifiers consisting of:
//! - An index, recycled once the referent is removed
//! - A version counter that changes on every recycle
//! - Layer and flags bits classifying the referent
//!
//! A handle carries no ownership. Whether its referent still exists is
//! answered by the storage that issued it, never by the handle alone.

use std::fmt;

use bytemuck::{Pod, Zeroable};

const INDEX_BITS: u32 = 32;
const VERSION_BITS: u32 = 16;
const LAYER_BITS: u32 = 8;

const VERSION_SHIFT: u32 = INDEX_BITS;
const LAYER_SHIFT: u32 = VERSION_SHIFT + VERSION_BITS;
const FLAGS_SHIFT: u32 = LAYER_SHIFT + LAYER_BITS;

/// Opaque identifier for an object in a storage container.
///
/// Bit layout, low to high:
/// - bits 0..32: index
/// - bits 32..48: version
/// - bits 48..56: layer
/// - bits 56..64: flags
///
/// Index `0` is never issued, so the all-zero value is free to act as
/// [`Handle::NULL`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct Handle(u64);

impl Handle {
    /// The reserved null handle.
    pub const NULL: Self = Self(0);

    /// Packs the four fields into a handle.
    ///
    /// # Arguments
    ///
    /// * `index` - Slot index (0 is reserved for null)
    /// * `version` - Generation counter
    /// * `layer` - Layer classification
    /// * `flags` - Caller-defined flag bits
    #[inline]
    #[must_use]
    pub const fn join(index: u32, version: u16, layer: u8, flags: u8) -> Self {
        Self(
            (index as u64)
                | ((version as u64) << VERSION_SHIFT)
                | ((layer as u64) << LAYER_SHIFT)
                | ((flags as u64) << FLAGS_SHIFT),
        )
    }

    /// Rebuilds a handle from its raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the version portion of the handle.
    #[inline]
    #[must_use]
    pub const fn version(self) -> u16 {
        (self.0 >> VERSION_SHIFT) as u16
    }

    /// Returns the layer portion of the handle.
    #[inline]
    #[must_use]
    pub const fn layer(self) -> u8 {
        (self.0 >> LAYER_SHIFT) as u8
    }

    /// Returns the flags portion of the handle.
    #[inline]
    #[must_use]
    pub const fn flags(self) -> u8 {
        (self.0 >> FLAGS_SHIFT) as u8
    }

    /// Checks that this is not the null handle.
    ///
    /// This does not prove the referent is alive.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::NULL.0
    }

    /// Returns a copy of this handle with a different version.
    #[inline]
    #[must_use]
    pub const fn with_version(self, version: u16) -> Self {
        Self::join(self.index(), version, self.layer(), self.flags())
    }

    /// Produces the next generation of this handle's index.
    ///
    /// The version is bumped (wrapping), the index is kept and layer and
    /// flags are replaced. The receiver is left untouched.
    #[inline]
    #[must_use]
    pub const fn recycle(self, layer: u8, flags: u8) -> Self {
        Self::join(self.index(), self.version().wrapping_add(1), layer, flags)
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("Handle(null)");
        }
        f.debug_struct("Handle")
            .field("index", &self.index())
            .field("version", &self.version())
            .field("layer", &self.layer())
            .field("flags", &self.flags())
            .finish()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}:{}", self.index(), self.version())
        } else {
            f.write_str("null")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_fields_roundtrip() {
        let handle = Handle::join(0xDEAD_BEEF, 0x1234, 0x56, 0x78);
        assert_eq!(handle.index(), 0xDEAD_BEEF);
        assert_eq!(handle.version(), 0x1234);
        assert_eq!(handle.layer(), 0x56);
        assert_eq!(handle.flags(), 0x78);
        assert_eq!(Handle::from_bits(handle.to_bits()), handle);
    }

    #[test]
    fn test_null_is_invalid() {
        assert!(!Handle::NULL.is_valid());
        assert!(!Handle::default().is_valid());
        assert!(Handle::join(1, 0, 0, 0).is_valid());
    }

    #[test]
    fn test_recycle_bumps_version_and_keeps_index() {
        let old = Handle::join(7, 3, 1, 0b1010);
        let new = old.recycle(2, 0b0001);

        assert_eq!(new.index(), 7);
        assert_eq!(new.version(), 4);
        assert_eq!(new.layer(), 2);
        assert_eq!(new.flags(), 0b0001);
        assert_ne!(old, new);
        // The original value is unchanged.
        assert_eq!(old.version(), 3);
    }

    #[test]
    fn test_recycle_wraps_version() {
        let handle = Handle::join(9, u16::MAX, 0, 0).recycle(0, 0);
        assert_eq!(handle.version(), 0);
        assert_eq!(handle.index(), 9);
    }

    #[test]
    fn test_with_version_preserves_other_fields() {
        let handle = Handle::join(42, 1, 3, 4).with_version(99);
        assert_eq!(handle, Handle::join(42, 99, 3, 4));
    }

    #[test]
    fn test_display() {
        assert_eq!(Handle::join(3, 2, 0, 0).to_string(), "3:2");
        assert_eq!(Handle::NULL.to_string(), "null");
    }

    #[test]
    fn test_handle_is_pod() {
        let handles = [Handle::join(1, 0, 0, 0), Handle::join(2, 5, 0, 0)];
        let bits: &[u64] = bytemuck::cast_slice(&handles);
        assert_eq!(bits, &[1, (5 << 32) | 2]);
    }
}
