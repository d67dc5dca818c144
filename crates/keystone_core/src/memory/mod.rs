//! # Memory Management
//!
//! Fixed-capacity slot blocks that back the block-storage container.
//!
//! ## Design Philosophy
//!
//! Slot memory is reserved once per block and reused:
//! - Freed slots go back on a free-list
//! - Growth appends whole blocks, existing slots never move
//! - Every slot carries a validity tag that reads are checked against

mod block;

pub use block::Block;
