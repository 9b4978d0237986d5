//! # Arena Dynamic Array
//!
//! Growable array of plain-data elements backed by one arena block.
//!
//! Growth doubles the capacity (1, 2, 4, 8, ...). The live prefix is copied
//! into the new block and the old block is abandoned inside the arena.

use std::cell::Ref;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};

use bytemuck::Pod;

use crate::error::{PoolError, PoolResult};
use crate::memory::{self, Allocation, Arena, WORD};

/// A growable array stored in an [`Arena`].
///
/// # Example
///
/// ```rust
/// use burrow_core::{Arena, DynArray};
///
/// let arena = Arena::new(4096).unwrap();
/// let mut ports: DynArray<'_, u16> = DynArray::new(&arena);
///
/// for port in [443, 80, 8080, 80] {
///     ports.push_back(port).unwrap();
/// }
/// assert_eq!(ports.remove(&80), 2);
/// assert_eq!(&*ports.as_slice(), &[443, 8080]);
/// ```
pub struct DynArray<'a, T> {
    arena: &'a Arena,
    /// Element storage; `None` until the first reservation.
    block: Option<Allocation>,
    len: usize,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<'a, T: Pod> DynArray<'a, T> {
    /// Creates an empty array. Nothing is allocated until the first push.
    #[must_use]
    pub const fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            block: None,
            len: 0,
            capacity: 0,
            _marker: PhantomData,
        }
    }

    /// Creates an empty array with room for `capacity` elements.
    ///
    /// # Errors
    ///
    /// Same as [`DynArray::reserve`].
    pub fn with_capacity(arena: &'a Arena, capacity: usize) -> PoolResult<Self> {
        let mut array = Self::new(arena);
        array.reserve(capacity)?;
        Ok(array)
    }

    /// Number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the array holds no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Elements the current block can hold.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ensures room for `capacity` elements in total.
    ///
    /// Does nothing if the array is already that large. Otherwise moves the
    /// elements into a new block of exactly `capacity` elements.
    ///
    /// # Errors
    ///
    /// - [`PoolError::UnsupportedLayout`] if `T` is zero-sized or
    ///   over-aligned
    /// - [`PoolError::OutOfMemory`] if the arena cannot supply the block
    pub fn reserve(&mut self, capacity: usize) -> PoolResult<()> {
        if capacity <= self.capacity {
            return Ok(());
        }
        memory::check_element::<T>()?;

        let bytes = capacity
            .checked_mul(size_of::<T>())
            .ok_or(PoolError::OutOfMemory {
                requested: usize::MAX,
            })?;
        let block = self
            .arena
            .allocate_block(bytes, align_of::<T>().max(WORD))?;

        if let Some(old) = self.block {
            self.arena.copy_bytes(&old.slice(0, self.len * size_of::<T>()), &block);
            self.arena.release(&old);
        }
        self.block = Some(block);
        self.capacity = capacity;
        Ok(())
    }

    /// Appends `value`, doubling the capacity when full.
    ///
    /// # Errors
    ///
    /// Same as [`DynArray::reserve`]. The array is unchanged on error.
    pub fn push_back(&mut self, value: T) -> PoolResult<()> {
        if self.len == self.capacity {
            let grown = self.capacity.checked_mul(2).ok_or(PoolError::OutOfMemory {
                requested: usize::MAX,
            })?;
            self.reserve(grown.max(1))?;
        }
        self.write(self.len, &value);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the last element.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.read(self.len))
    }

    /// Returns a copy of the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        (index < self.len).then(|| self.read(index))
    }

    /// Overwrites the element at `index`. Returns false if out of bounds.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        if index >= self.len {
            return false;
        }
        self.write(index, &value);
        true
    }

    /// Returns a copy of the first element.
    #[must_use]
    pub fn first(&self) -> Option<T> {
        self.get(0)
    }

    /// Returns a copy of the last element.
    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.len.checked_sub(1).and_then(|index| self.get(index))
    }

    /// Removes every element equal to `value`, keeping the order of the
    /// rest. Returns the number removed.
    pub fn remove(&mut self, value: &T) -> usize
    where
        T: PartialEq,
    {
        self.remove_if(|element| element == value)
    }

    /// Removes every element matching `predicate`, keeping the order of the
    /// rest. Returns the number removed. Capacity is unchanged.
    pub fn remove_if<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut kept = 0;
        for index in 0..self.len {
            let element = self.read(index);
            if predicate(&element) {
                continue;
            }
            if kept != index {
                self.write(kept, &element);
            }
            kept += 1;
        }

        let removed = self.len - kept;
        self.len = kept;
        removed
    }

    /// Applies `mutator` to the first element matching `predicate`.
    ///
    /// Returns false if no element matched.
    pub fn update<P, F>(&mut self, mut predicate: P, mutator: F) -> bool
    where
        P: FnMut(&T) -> bool,
        F: FnOnce(&mut T),
    {
        for index in 0..self.len {
            let mut element = self.read(index);
            if predicate(&element) {
                mutator(&mut element);
                self.write(index, &element);
                return true;
            }
        }
        false
    }

    /// Sorts the elements in place. Not stable.
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        let Some(block) = self.block else {
            return;
        };
        let live = block.slice(0, self.len * size_of::<T>());
        let mut bytes = self.arena.bytes_mut(&live);
        bytemuck::cast_slice_mut::<u8, T>(&mut bytes).sort_unstable();
    }

    /// Drops every element, keeping the capacity.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Borrows the live elements as a slice.
    ///
    /// # Panics
    ///
    /// Panics if another mutable byte guard of the arena is alive.
    #[must_use]
    pub fn as_slice(&self) -> Ref<'_, [T]> {
        let live = self
            .block
            .map_or_else(Allocation::default, |block| {
                block.slice(0, self.len * size_of::<T>())
            });
        Ref::map(self.arena.bytes(&live), |bytes| {
            bytemuck::cast_slice::<u8, T>(bytes)
        })
    }

    /// Iterates over copies of the elements, front to back.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(|index| self.read(index))
    }

    fn element(&self, index: usize) -> Allocation {
        debug_assert!(index < self.capacity);
        let size = size_of::<T>();
        // `block` is always set once capacity > 0.
        self.block
            .unwrap_or_default()
            .slice(index * size, size)
    }

    fn read(&self, index: usize) -> T {
        bytemuck::pod_read_unaligned(&self.arena.bytes(&self.element(index)))
    }

    fn write(&self, index: usize, value: &T) {
        self.arena
            .bytes_mut(&self.element(index))
            .copy_from_slice(bytemuck::bytes_of(value));
    }
}

impl<T: Pod + std::fmt::Debug> std::fmt::Debug for DynArray<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
