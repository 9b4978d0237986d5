//! # Memory Management
//!
//! Region arenas for bulk-lifetime allocation.
//!
//! ## Design Philosophy
//!
//! Memory is handed out by bumping a cursor and reclaimed only when the whole
//! arena goes away:
//! - No per-object free
//! - No free-list bookkeeping
//! - Handles are (region, offset) positions, never raw pointers

mod arena;
mod region;

pub use arena::{Allocation, Arena, ArenaStats};
pub use region::{REGION_ALIGN, WORD};

use crate::error::{PoolError, PoolResult};

/// Rejects types aligned above what a region can guarantee.
pub(crate) fn check_align<T>() -> PoolResult<()> {
    let align = std::mem::align_of::<T>();
    if align > REGION_ALIGN {
        return Err(PoolError::UnsupportedLayout {
            size: std::mem::size_of::<T>(),
            align,
        });
    }
    Ok(())
}

/// Rejects element types that cannot occupy a slot of an arena block.
///
/// On top of [`check_align`], zero-sized types are refused.
pub(crate) fn check_element<T>() -> PoolResult<()> {
    if std::mem::size_of::<T>() == 0 {
        return Err(PoolError::UnsupportedLayout {
            size: 0,
            align: std::mem::align_of::<T>(),
        });
    }
    check_align::<T>()
}
