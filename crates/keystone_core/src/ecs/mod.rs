//! # Entity Component System
//!
//! Handle-addressed storage for game objects and their components.
//!
//! ## Design Philosophy
//!
//! - A [`Handle`] is a packed 64-bit word: index, version, layer, flags
//! - Stale handles never resolve, the version changes on every reuse
//! - Components are stored in dense arrays for cache efficiency
//! - Removal is deferred to the end of the frame

mod alias;
mod block_storage;
mod component;
mod entity;
mod generator;
mod handle;
mod index_map;
mod storage;
mod world;

pub use alias::AliasTable;
pub use block_storage::{BlockStorage, SlotLocation};
pub use component::{Component, Transform, MAX_COMPONENT_TYPES};
pub use entity::{Entity, EntityInfo};
pub use generator::HandleGenerator;
pub use handle::Handle;
pub use index_map::IndexMap;
pub use storage::{ComponentStorage, DenseStorage};
pub use world::{SweepStats, World};
