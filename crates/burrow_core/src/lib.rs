//! # BURROW Core
//!
//! Region arena allocator and the containers built on top of it:
//! - Bump allocation from chained fixed-size pages
//! - Oversized requests in their own huge regions
//! - No per-object free; everything is reclaimed when the arena drops
//! - A chained hash table and a dynamic array stored in arena blocks
//!
//! ## Architecture Rules
//!
//! 1. **One arena per unit of work** - a request, a parse, a batch
//! 2. **Handles, not pointers** - allocations are (region, offset, len)
//! 3. **Plain data only** - container elements are `Pod`
//!
//! ## Example
//!
//! ```rust
//! use burrow_core::{Arena, DynArray, HashTable, StrView};
//!
//! let arena = Arena::new(16 * 1024).unwrap();
//!
//! let mut headers: HashTable<'_, u64, StrView> = HashTable::new(&arena).unwrap();
//! let host = arena.duplicate_str("example.org").unwrap();
//! headers.set(1, host).unwrap();
//!
//! let mut order: DynArray<'_, u64> = DynArray::new(&arena);
//! order.push_back(1).unwrap();
//!
//! let stored = headers.get(&1).unwrap();
//! assert!(arena.view_eq(&stored, "example.org"));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collections;
pub mod config;
pub mod error;
pub mod memory;
pub mod text;

pub use collections::{DynArray, HashTable};
pub use config::{ArenaConfig, PoolConfig, TableConfig};
pub use error::{PoolError, PoolResult};
pub use memory::{Allocation, Arena, ArenaStats, REGION_ALIGN, WORD};
pub use text::StrView;
