//! # Arena Regions
//!
//! One fixed-capacity block of the arena chain.

use crate::error::{PoolError, PoolResult};

/// Backing cell of every region.
///
/// Storing regions as `u128` cells pins the base address to the largest
/// primitive alignment, so aligning an offset aligns the address.
type Cell = u128;

/// Size of one backing cell in bytes.
const CELL_SIZE: usize = std::mem::size_of::<Cell>();

/// Alignment of every region's first byte.
pub const REGION_ALIGN: usize = std::mem::align_of::<Cell>();

/// Machine word size. Aligned allocations start on a multiple of this.
pub const WORD: usize = std::mem::size_of::<usize>();

/// Rounds `value` up to the next multiple of `align` (a power of two).
///
/// Returns `None` on overflow.
#[inline]
#[must_use]
pub(crate) const fn align_up(value: usize, align: usize) -> Option<usize> {
    match value.checked_add(align - 1) {
        Some(bumped) => Some(bumped & !(align - 1)),
        None => None,
    }
}

/// What a region was created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RegionKind {
    /// The first region, created with the arena.
    Root,
    /// A same-sized successor appended when the chain ran out of space.
    Page,
    /// A request-sized region for one oversized allocation.
    Huge,
}

/// A contiguous byte block `[begin, end)` with a bump cursor.
///
/// # Invariants
///
/// - `cursor <= capacity`
/// - `capacity` never changes after construction
pub(crate) struct Region {
    /// Zero-initialized backing storage, at least `capacity` bytes.
    storage: Box<[Cell]>,
    /// Usable size in bytes (`end - begin`).
    capacity: usize,
    /// Offset of the first free byte (`data - begin`).
    cursor: usize,
    /// Next region in the chain.
    next: Option<usize>,
    /// Why this region exists.
    kind: RegionKind,
}

impl Region {
    /// Reserves a new zero-filled region of `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfMemory`] if the system cannot supply the bytes.
    pub(crate) fn new(capacity: usize, kind: RegionKind) -> PoolResult<Self> {
        let cells = capacity.div_ceil(CELL_SIZE);

        let mut storage: Vec<Cell> = Vec::new();
        if storage.try_reserve_exact(cells).is_err() {
            tracing::error!(capacity, ?kind, "bad alloc: could not reserve arena region");
            return Err(PoolError::OutOfMemory {
                requested: capacity,
            });
        }
        storage.resize(cells, 0);

        Ok(Self {
            storage: storage.into_boxed_slice(),
            capacity,
            cursor: 0,
            next: None,
            kind,
        })
    }

    /// Fixed capacity in bytes.
    #[inline]
    #[must_use]
    pub(crate) const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes consumed so far, alignment padding included.
    #[inline]
    #[must_use]
    pub(crate) const fn used(&self) -> usize {
        self.cursor
    }

    #[inline]
    #[must_use]
    pub(crate) const fn kind(&self) -> RegionKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub(crate) const fn next(&self) -> Option<usize> {
        self.next
    }

    #[inline]
    pub(crate) fn set_next(&mut self, next: Option<usize>) {
        self.next = next;
    }

    /// Address of the region's first byte.
    #[inline]
    #[must_use]
    pub(crate) fn base_address(&self) -> usize {
        self.storage.as_ptr() as usize
    }

    /// Claims `size` bytes at the next `align` boundary.
    ///
    /// Returns the offset of the claimed range, or `None` if the region
    /// does not have enough trailing space. The cursor only moves on success.
    pub(crate) fn try_bump(&mut self, size: usize, align: usize) -> Option<usize> {
        let start = align_up(self.cursor, align)?;
        let end = start.checked_add(size)?;
        if end > self.capacity {
            return None;
        }
        self.cursor = end;
        Some(start)
    }

    /// Claims the first `size` bytes of a fresh region.
    pub(crate) fn claim_front(&mut self, size: usize) {
        debug_assert_eq!(self.cursor, 0, "claim_front on a used region");
        debug_assert!(size <= self.capacity);
        self.cursor = size;
    }

    /// The usable bytes of this region.
    #[inline]
    #[must_use]
    pub(crate) fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<Cell, u8>(&self.storage)[..self.capacity]
    }

    /// The usable bytes of this region, mutably.
    #[inline]
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<Cell, u8>(&mut self.storage)[..self.capacity]
    }
}
