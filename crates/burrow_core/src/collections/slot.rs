//! # Hash Table Slots
//!
//! Byte layout of one slot record inside an arena block:
//!
//! ```text
//! +-------------------------------+-----+-------+
//! | header (next region+1, next   | key | value |
//! | offset, used)                 |     |       |
//! +-------------------------------+-----+-------+
//! ```
//!
//! A zeroed record is an empty slot with no successor, so bucket arrays and
//! overflow slots are simply zero-filled arena blocks.

use std::marker::PhantomData;
use std::mem::{align_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::error::PoolResult;
use crate::memory::{self, Allocation};

/// Link and occupancy of a slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct SlotHeader {
    /// Region of the next slot plus one. Zero terminates the chain.
    next_region: usize,
    /// Offset of the next slot inside its region.
    next_offset: usize,
    /// Non-zero while the slot holds a live entry.
    used: usize,
}

const HEADER_SIZE: usize = size_of::<SlotHeader>();

impl SlotHeader {
    #[inline]
    pub(crate) const fn is_used(&self) -> bool {
        self.used != 0
    }

    /// Position of the next slot in the chain.
    #[inline]
    pub(crate) const fn next(&self, stride: usize) -> Option<Allocation> {
        if self.next_region == 0 {
            None
        } else {
            Some(Allocation::new(self.next_region - 1, self.next_offset, stride))
        }
    }
}

/// Field offsets of a `(K, V)` slot record.
pub(crate) struct SlotLayout<K, V> {
    key_offset: usize,
    value_offset: usize,
    stride: usize,
    align: usize,
    _marker: PhantomData<(K, V)>,
}

// Manual impls: the layout is copyable whatever `K` and `V` are.
impl<K, V> Clone for SlotLayout<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for SlotLayout<K, V> {}

impl<K: Pod, V: Pod> SlotLayout<K, V> {
    /// Computes the record layout.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PoolError::UnsupportedLayout`] if `K` or `V` is
    /// aligned above the region alignment.
    pub(crate) fn new() -> PoolResult<Self> {
        memory::check_align::<K>()?;
        memory::check_align::<V>()?;

        let align = align_of::<SlotHeader>()
            .max(align_of::<K>())
            .max(align_of::<V>());
        let key_offset = round_up(HEADER_SIZE, align_of::<K>());
        let value_offset = round_up(key_offset + size_of::<K>(), align_of::<V>());
        let stride = round_up(value_offset + size_of::<V>(), align);

        Ok(Self {
            key_offset,
            value_offset,
            stride,
            align,
            _marker: PhantomData,
        })
    }

    /// Bytes per slot record.
    #[inline]
    pub(crate) const fn stride(&self) -> usize {
        self.stride
    }

    /// Alignment every slot record needs.
    #[inline]
    pub(crate) const fn align(&self) -> usize {
        self.align
    }

    /// Position of slot `index` inside a bucket array.
    #[inline]
    pub(crate) const fn slot_at(&self, array: &Allocation, index: usize) -> Allocation {
        array.slice(index * self.stride, self.stride)
    }

    pub(crate) fn header(&self, record: &[u8]) -> SlotHeader {
        bytemuck::pod_read_unaligned(&record[..HEADER_SIZE])
    }

    pub(crate) fn key(&self, record: &[u8]) -> K {
        bytemuck::pod_read_unaligned(&record[self.key_offset..self.key_offset + size_of::<K>()])
    }

    pub(crate) fn value(&self, record: &[u8]) -> V {
        bytemuck::pod_read_unaligned(
            &record[self.value_offset..self.value_offset + size_of::<V>()],
        )
    }

    /// Stores an entry and marks the slot live. The chain link is kept.
    pub(crate) fn write_entry(&self, record: &mut [u8], key: &K, value: &V) {
        record[self.key_offset..self.key_offset + size_of::<K>()]
            .copy_from_slice(bytemuck::bytes_of(key));
        self.write_value(record, value);
        self.write_used(record, true);
    }

    pub(crate) fn write_value(&self, record: &mut [u8], value: &V) {
        record[self.value_offset..self.value_offset + size_of::<V>()]
            .copy_from_slice(bytemuck::bytes_of(value));
    }

    /// Clears key and value and marks the slot unused, leaving it linked.
    pub(crate) fn clear_entry(&self, record: &mut [u8]) {
        record[self.key_offset..self.key_offset + size_of::<K>()].fill(0);
        record[self.value_offset..self.value_offset + size_of::<V>()].fill(0);
        self.write_used(record, false);
    }

    /// Points this record's `next` link at `next`.
    pub(crate) fn link(&self, record: &mut [u8], next: &Allocation) {
        let mut header = self.header(record);
        header.next_region = next.region() + 1;
        header.next_offset = next.offset();
        record[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
    }

    fn write_used(&self, record: &mut [u8], used: bool) {
        let mut header = self.header(record);
        header.used = usize::from(used);
        record[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
    }
}

/// Rounds `value` up to a multiple of `align` (a power of two).
const fn round_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
