//! # Arena Allocator
//!
//! A chained bump allocator. Allocations are never freed individually; all
//! bytes are reclaimed at once when the arena is dropped.
//!
//! ## Chain Layout
//!
//! ```text
//! root -> huge (newest) -> huge -> page -> page (tail)
//!   ^                                       ^
//!   first region                            active cache after growth
//! ```
//!
//! - Requests that fit a region are served by scanning from the active
//!   region towards the tail. When nothing fits, a page of the root's
//!   capacity is appended and becomes active.
//! - Requests larger than the root's capacity get their own region, spliced
//!   in right after the root. Huge regions are full on arrival, so they never
//!   sit on the fast path.

use std::cell::{Ref, RefCell, RefMut};
use std::ffi::CStr;

use bytemuck::{Pod, Zeroable};

use super::region::{Region, RegionKind, REGION_ALIGN, WORD};
use crate::config::ArenaConfig;
use crate::error::{PoolError, PoolResult};
use crate::text::{self, StrView};

/// Index of the root region.
const ROOT: usize = 0;

/// Handle to a byte range inside an [`Arena`].
///
/// Handles are positions (region, offset, length), not pointers. They stay
/// valid for the lifetime of the arena that produced them and are plain
/// data, so they can be stored inside arena-backed containers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Allocation {
    /// Region index inside the arena.
    region: usize,
    /// Byte offset from the region's first byte.
    offset: usize,
    /// Length in bytes.
    len: usize,
}

impl Allocation {
    #[inline]
    #[must_use]
    pub(crate) const fn new(region: usize, offset: usize, len: usize) -> Self {
        Self {
            region,
            offset,
            len,
        }
    }

    /// Index of the region holding these bytes.
    #[inline]
    #[must_use]
    pub const fn region(&self) -> usize {
        self.region
    }

    /// Offset of the first byte inside its region.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the range is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sub-range `[offset, offset + len)` relative to this allocation.
    #[inline]
    #[must_use]
    pub(crate) const fn slice(&self, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= self.len);
        Self {
            region: self.region,
            offset: self.offset + offset,
            len,
        }
    }
}

/// Snapshot of an arena's footprint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Regions in the chain, root included.
    pub regions: usize,
    /// Same-sized pages appended after the root.
    pub pages: usize,
    /// Request-sized regions created for oversized allocations.
    pub huge_regions: usize,
    /// Bytes consumed across all regions, alignment padding included.
    pub used: usize,
    /// Sum of every region's fixed capacity.
    pub total_capacity: usize,
}

/// Mutable arena state, guarded by the arena's `RefCell`.
struct ArenaState {
    /// Every region ever created. Index 0 is the root.
    regions: Vec<Region>,
    /// Region where the allocation scan starts.
    active: usize,
}

impl ArenaState {
    /// Appends a page of `capacity` bytes to the chain tail and serves
    /// `size` bytes from its start.
    fn page(&mut self, capacity: usize, size: usize) -> PoolResult<Allocation> {
        let mut region = Region::new(capacity, RegionKind::Page)?;
        region.claim_front(size);

        let id = self.regions.len();
        let mut tail = self.active;
        while let Some(next) = self.regions[tail].next() {
            tail = next;
        }
        self.regions[tail].set_next(Some(id));
        self.regions.push(region);
        self.active = id;

        tracing::debug!(region = id, capacity, "chained new arena page");
        Ok(Allocation::new(id, 0, size))
    }

    /// Creates a region sized exactly to `size` and splices it in right
    /// after the root. The active cache is left alone.
    fn huge(&mut self, size: usize) -> PoolResult<Allocation> {
        let mut region = Region::new(size, RegionKind::Huge)?;
        region.claim_front(size);

        let id = self.regions.len();
        region.set_next(self.regions[ROOT].next());
        self.regions[ROOT].set_next(Some(id));
        self.regions.push(region);

        tracing::debug!(region = id, size, "spliced huge region after root");
        Ok(Allocation::new(id, 0, size))
    }
}

/// A region-chaining bump allocator.
///
/// Every byte handed out stays valid and unchanged until the arena is
/// dropped, no matter how many allocations follow. There is no per-object
/// free: [`Arena::release`] exists only to make that explicit.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per thread.
///
/// # Borrowing
///
/// Byte access goes through [`Ref`]/[`RefMut`] guards. Drop them before the
/// next allocation: allocating while a guard is alive panics.
///
/// # Example
///
/// ```rust
/// use burrow_core::Arena;
///
/// let arena = Arena::new(64).unwrap();
/// let first = arena.allocate_aligned(40).unwrap();
/// let second = arena.allocate_aligned(40).unwrap();
///
/// // 40 + 40 > 64: the second request was served from a chained page.
/// assert_ne!(first.region(), second.region());
/// assert_eq!(arena.estimate_total_capacity(), 128);
/// ```
pub struct Arena {
    /// Regions, chain links and the active cache.
    state: RefCell<ArenaState>,
    /// Fixed capacity of the root region and of every page.
    capacity: usize,
}

impl Arena {
    /// Creates a new arena whose regions hold `capacity` bytes each.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ZeroCapacity`] if `capacity` is zero
    /// - [`PoolError::OutOfMemory`] if the root region cannot be reserved
    pub fn new(capacity: usize) -> PoolResult<Self> {
        if capacity == 0 {
            return Err(PoolError::ZeroCapacity);
        }

        let root = Region::new(capacity, RegionKind::Root)?;
        Ok(Self {
            state: RefCell::new(ArenaState {
                regions: vec![root],
                active: ROOT,
            }),
            capacity,
        })
    }

    /// Creates an arena from its configuration section.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::new`].
    pub fn from_config(config: &ArenaConfig) -> PoolResult<Self> {
        Self::new(config.region_capacity)
    }

    /// Returns the fixed capacity of the root region in bytes.
    ///
    /// Requests larger than this take the huge-region path.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Allocates `size` bytes starting on a machine-word boundary.
    ///
    /// The bytes are not cleared.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfMemory`] if a new region is needed and
    /// cannot be reserved.
    pub fn allocate_aligned(&self, size: usize) -> PoolResult<Allocation> {
        self.allocate_block(size, WORD)
    }

    /// Allocates `size` bytes at the raw cursor, without alignment.
    ///
    /// Used for byte strings where alignment is irrelevant.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfMemory`] if a new region is needed and
    /// cannot be reserved.
    pub fn allocate_packed(&self, size: usize) -> PoolResult<Allocation> {
        self.allocate_block(size, 1)
    }

    /// Allocates `size` word-aligned bytes and zero-fills them.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfMemory`] if a new region is needed and
    /// cannot be reserved.
    pub fn allocate_zeroed(&self, size: usize) -> PoolResult<Allocation> {
        self.allocate_block_zeroed(size, WORD)
    }

    /// Allocates `size` bytes aligned to `align`.
    ///
    /// `align` must be a power of two no larger than the region alignment.
    pub(crate) fn allocate_block(&self, size: usize, align: usize) -> PoolResult<Allocation> {
        debug_assert!(align.is_power_of_two() && align <= REGION_ALIGN);

        let mut state = self.state.borrow_mut();
        if size > self.capacity {
            return state.huge(size);
        }

        let mut cursor = Some(state.active);
        while let Some(id) = cursor {
            let region = &mut state.regions[id];
            if let Some(offset) = region.try_bump(size, align) {
                return Ok(Allocation::new(id, offset, size));
            }
            cursor = region.next();
        }

        state.page(self.capacity, size)
    }

    /// [`Arena::allocate_block`] followed by zero-filling the block.
    pub(crate) fn allocate_block_zeroed(
        &self,
        size: usize,
        align: usize,
    ) -> PoolResult<Allocation> {
        let allocation = self.allocate_block(size, align)?;
        self.bytes_mut(&allocation).fill(0);
        Ok(allocation)
    }

    /// Places a copy of `value` in the arena.
    ///
    /// # Errors
    ///
    /// - [`PoolError::UnsupportedLayout`] if `T` is aligned above the region
    ///   alignment
    /// - [`PoolError::OutOfMemory`] if a new region cannot be reserved
    pub fn alloc_value<T: Pod>(&self, value: &T) -> PoolResult<Allocation> {
        super::check_align::<T>()?;
        let allocation = self.allocate_block(std::mem::size_of::<T>(), std::mem::align_of::<T>())?;
        self.bytes_mut(&allocation)
            .copy_from_slice(bytemuck::bytes_of(value));
        Ok(allocation)
    }

    /// Reads back a value placed with [`Arena::alloc_value`].
    ///
    /// # Panics
    ///
    /// Panics if the allocation is shorter than `T`.
    #[must_use]
    pub fn read_value<T: Pod>(&self, allocation: &Allocation) -> T {
        let bytes = self.bytes(allocation);
        bytemuck::pod_read_unaligned(&bytes[..std::mem::size_of::<T>()])
    }

    /// Copies `source` into the arena and returns a view of the copy.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfMemory`] if a new region cannot be reserved.
    pub fn duplicate_bytes(&self, source: &[u8]) -> PoolResult<StrView> {
        let allocation = self.allocate_packed(source.len())?;
        self.bytes_mut(&allocation).copy_from_slice(source);
        Ok(StrView::from_allocation(allocation))
    }

    /// Copies the UTF-8 bytes of `source` into the arena.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfMemory`] if a new region cannot be reserved.
    pub fn duplicate_str(&self, source: &str) -> PoolResult<StrView> {
        self.duplicate_bytes(source.as_bytes())
    }

    /// Copies a C string, without its terminating NUL, into the arena.
    ///
    /// `None` yields the empty view and allocates nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfMemory`] if a new region cannot be reserved.
    pub fn duplicate_cstring(&self, source: Option<&CStr>) -> PoolResult<StrView> {
        match source {
            Some(source) => self.duplicate_bytes(source.to_bytes()),
            None => Ok(StrView::default()),
        }
    }

    /// Does nothing.
    ///
    /// The arena only reclaims memory in bulk, when it is dropped. This
    /// method exists so callers porting free-based code have an explicit,
    /// documented no-op instead of assuming conventional allocator semantics.
    #[inline]
    #[allow(clippy::unused_self)]
    pub fn release(&self, _allocation: &Allocation) {}

    /// Does nothing. Forwards to [`Arena::release`] for the view's bytes.
    #[inline]
    pub fn release_str(&self, view: &StrView) {
        self.release(&view.allocation());
    }

    /// Sum of the fixed capacity of the root and every chained region.
    ///
    /// A diagnostic only; allocation decisions never consult it.
    #[must_use]
    pub fn estimate_total_capacity(&self) -> usize {
        let state = self.state.borrow();
        let mut total = 0;
        let mut cursor = Some(ROOT);
        while let Some(id) = cursor {
            let region = &state.regions[id];
            total += region.capacity();
            cursor = region.next();
        }
        total
    }

    /// Number of regions in the chain, root included.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.state.borrow().regions.len()
    }

    /// Bytes consumed across all regions, alignment padding included.
    #[must_use]
    pub fn used(&self) -> usize {
        self.state.borrow().regions.iter().map(Region::used).sum()
    }

    /// Footprint snapshot.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        let state = self.state.borrow();
        let mut stats = ArenaStats::default();
        for region in &state.regions {
            stats.regions += 1;
            stats.used += region.used();
            stats.total_capacity += region.capacity();
            match region.kind() {
                RegionKind::Root => {}
                RegionKind::Page => stats.pages += 1,
                RegionKind::Huge => stats.huge_regions += 1,
            }
        }
        stats
    }

    /// Machine address of the allocation's first byte.
    ///
    /// Stable for the arena's lifetime.
    #[must_use]
    pub fn address_of(&self, allocation: &Allocation) -> usize {
        let state = self.state.borrow();
        state.regions[allocation.region].base_address() + allocation.offset
    }

    /// Borrows the bytes of an allocation.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not produced by this arena, or if a
    /// [`Arena::bytes_mut`] guard is alive.
    #[must_use]
    pub fn bytes(&self, allocation: &Allocation) -> Ref<'_, [u8]> {
        let range = allocation.offset..allocation.offset + allocation.len;
        Ref::map(self.state.borrow(), |state| {
            &state.regions[allocation.region].bytes()[range]
        })
    }

    /// Mutably borrows the bytes of an allocation.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not produced by this arena, or if any other
    /// byte guard is alive.
    #[must_use]
    pub fn bytes_mut(&self, allocation: &Allocation) -> RefMut<'_, [u8]> {
        let range = allocation.offset..allocation.offset + allocation.len;
        RefMut::map(self.state.borrow_mut(), |state| {
            &mut state.regions[allocation.region].bytes_mut()[range]
        })
    }

    /// Copies `source` into the front of `dest`, which may live in another
    /// region. Copies `min(source.len(), dest.len())` bytes.
    pub(crate) fn copy_bytes(&self, source: &Allocation, dest: &Allocation) {
        let len = source.len.min(dest.len);
        let from = source.offset..source.offset + len;
        let to = dest.offset..dest.offset + len;

        let mut state = self.state.borrow_mut();
        let regions = &mut state.regions;
        if source.region == dest.region {
            regions[source.region].bytes_mut().copy_within(from, dest.offset);
            return;
        }

        let (src, dst) = if source.region < dest.region {
            let (low, high) = regions.split_at_mut(dest.region);
            (&low[source.region], &mut high[0])
        } else {
            let (low, high) = regions.split_at_mut(source.region);
            (&high[0], &mut low[dest.region])
        };
        dst.bytes_mut()[to].copy_from_slice(&src.bytes()[from]);
    }

    /// Borrows the bytes behind a string view.
    ///
    /// # Panics
    ///
    /// Same as [`Arena::bytes`].
    #[must_use]
    pub fn view_bytes(&self, view: &StrView) -> Ref<'_, [u8]> {
        self.bytes(&view.allocation())
    }

    /// Returns true if the view holds exactly the bytes of `text`.
    #[must_use]
    pub fn view_eq(&self, view: &StrView, text: &str) -> bool {
        view.len() == text.len() && *self.view_bytes(view) == *text.as_bytes()
    }

    /// Offset of the first occurrence of `needle` inside `haystack`.
    ///
    /// See [`text::find`] for the empty-view conventions.
    #[must_use]
    pub fn find_in(&self, haystack: &StrView, needle: &StrView) -> Option<usize> {
        text::find(&self.view_bytes(haystack), &self.view_bytes(needle))
    }

    /// ASCII case-insensitive [`Arena::find_in`].
    #[must_use]
    pub fn find_in_ignore_case(&self, haystack: &StrView, needle: &StrView) -> Option<usize> {
        text::find_ignore_ascii_case(&self.view_bytes(haystack), &self.view_bytes(needle))
    }
}
