//! # Arena-Backed Collections
//!
//! Containers whose storage lives entirely in an [`crate::Arena`].
//!
//! Elements are plain data (`bytemuck::Pod`): they are copied into arena
//! bytes on insert and copied back out on read, so a container never holds
//! a borrow of the arena between calls.

mod dyn_array;
mod hash_table;
mod slot;

pub use dyn_array::DynArray;
pub use hash_table::{DefaultBuildHasher, HashTable, Iter};
