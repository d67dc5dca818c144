//! # Storage Error Types
//!
//! All errors that can occur in the storage core.
//!
//! Absence is not an error here: lookups on unknown or removed handles
//! return `None`/`false`. The variants below are either recoverable
//! (`CapacityExceeded` is absorbed by block growth) or caller-facing
//! rejections, except for the ones routed through [`fatal`], which mark
//! a broken invariant.

use thiserror::Error;

use crate::ecs::Handle;

/// Errors that can occur in the storage core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A block has no free slot left.
    #[error("block capacity exceeded: {capacity} slots in use")]
    CapacityExceeded {
        /// Capacity of the exhausted block.
        capacity: usize,
    },

    /// A slot was read or freed after it had already been freed.
    #[error("use of freed slot at position {position}")]
    UseOfFreedSlot {
        /// Position inside the block.
        position: usize,
    },

    /// A slot was constructed into twice without being freed.
    #[error("slot at position {position} is already occupied")]
    SlotOccupied {
        /// Position inside the block.
        position: usize,
    },

    /// A position past the block's high-water mark or capacity.
    #[error("slot position {position} out of range (limit {limit})")]
    SlotOutOfRange {
        /// The offending position.
        position: usize,
        /// Exclusive upper bound that was violated.
        limit: usize,
    },

    /// Two handles for the same logical object disagree.
    #[error("handle mismatch: expected {expected}, got {actual}")]
    HandleMismatch {
        /// The handle that was pre-fetched.
        expected: Handle,
        /// The handle that was actually issued.
        actual: Handle,
    },

    /// The null handle was used as a storage key.
    #[error("the null handle cannot be stored")]
    NullHandle,

    /// A handle is already present in the storage.
    #[error("handle {0} is already in use")]
    HandleInUse(Handle),

    /// A handle does not refer to a live object.
    #[error("unknown handle {0}")]
    UnknownHandle(Handle),

    /// The entity already carries a component of this type.
    #[error("entity {entity} already has component {component}")]
    DuplicateComponent {
        /// The owning entity.
        entity: Handle,
        /// Name of the component type.
        component: &'static str,
    },

    /// Two component types claim the same compile-time ID.
    #[error("component id {id} is registered to {registered}, not {requested}")]
    ComponentIdConflict {
        /// The contested ID.
        id: u8,
        /// Type already registered under the ID.
        registered: &'static str,
        /// Type that tried to register.
        requested: &'static str,
    },

    /// A component ID outside the supported range.
    #[error("component id {id} exceeds the limit of {limit} component types")]
    ComponentIdOutOfRange {
        /// The offending ID.
        id: u8,
        /// Number of supported component types.
        limit: usize,
    },

    /// The scene alias is already bound to a handle.
    #[error("alias `{0}` is already bound")]
    DuplicateAlias(String),

    /// The index map and the slot storage no longer agree.
    #[error("storage desynchronized: {0}")]
    Desynchronized(String),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Aborts on a broken storage invariant.
///
/// Index map / allocator desync and handle disagreement cannot be
/// continued past safely, so they are logged and turned into a panic.
#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn fatal(err: StorageError) -> ! {
    tracing::error!(error = %err, "storage invariant violated");
    panic!("storage invariant violated: {err}");
}
