//! # Keystone Core
//!
//! Generational handle storage for a game engine:
//! - Packed 64-bit handles that detect use-after-free
//! - Dense component storage with O(1) add, remove and lookup
//! - Block-backed storage whose values never move
//! - A [`World`] with deferred, end-of-frame destruction
//!
//! ## Architecture Rules
//!
//! 1. **Handles, not pointers** - References are re-resolved after every mutation
//! 2. **Data-oriented design** - Components are stored in contiguous arrays
//! 3. **Fail loudly** - Corrupted bookkeeping stops the process instead of aliasing
//!
//! ## Example
//!
//! ```rust
//! use keystone_core::ComponentStorage;
//!
//! let mut names = ComponentStorage::new();
//! let a = names.add("alpha");
//! let b = names.add("beta");
//!
//! assert!(names.remove(a));
//! assert_eq!(names.view(), &["beta"]);
//! assert_eq!(names.get(a), None);
//! assert_eq!(names.get(b), Some(&"beta"));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;

pub use config::{StorageConfig, WorldConfig, DEFAULT_BLOCK_CAPACITY};
pub use ecs::{
    AliasTable, BlockStorage, Component, ComponentStorage, DenseStorage, Entity, EntityInfo,
    Handle, HandleGenerator, IndexMap, SlotLocation, SweepStats, Transform, World,
    MAX_COMPONENT_TYPES,
};
pub use error::{StorageError, StorageResult};
pub use memory::Block;
