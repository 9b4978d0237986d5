//! # Arena Hash Table
//!
//! Separately chained hash table whose bucket array and overflow slots are
//! all arena blocks.
//!
//! ## Layout
//!
//! - One zeroed bucket array of `bucket_count` slot records
//! - Each bucket slot heads a singly linked chain of overflow slots,
//!   requested from the arena one at a time
//! - Removal clears a slot in place; the slot stays linked as a tombstone
//!   and is the first candidate for the next insert into that chain
//!
//! ## Growth
//!
//! When `len` reaches `floor(load_factor * bucket_count)`, the next `set`
//! builds a bucket array `growth_factor` times larger, re-inserts every live
//! entry and abandons the old array inside the arena.

use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};

use bytemuck::Pod;

use super::slot::SlotLayout;
use crate::config::TableConfig;
use crate::error::{PoolError, PoolResult};
use crate::memory::{Allocation, Arena};

/// Deterministic default hasher: equal keys hash equal across runs.
pub type DefaultBuildHasher = BuildHasherDefault<DefaultHasher>;

/// Where `place` put an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    /// A live slot with an equal key had its value replaced.
    Overwritten,
    /// An unused slot already in the chain was filled.
    Reused,
    /// A new overflow slot was linked after the chain tail.
    Appended,
}

/// A chained hash table stored in an [`Arena`].
///
/// Keys and values are plain data (`Pod`), copied in and out of slot
/// records. Lookups return copies.
///
/// # Example
///
/// ```rust
/// use burrow_core::{Arena, HashTable};
///
/// let arena = Arena::new(64 * 1024).unwrap();
/// let mut sessions: HashTable<'_, u64, u32> = HashTable::new(&arena).unwrap();
///
/// sessions.set(42, 1).unwrap();
/// sessions.update(&42, |hits| *hits += 1);
/// assert_eq!(sessions.get(&42), Some(2));
///
/// assert!(sessions.remove(&42));
/// assert_eq!(sessions.get(&42), None);
/// ```
pub struct HashTable<'a, K, V, S = DefaultBuildHasher> {
    /// Arena every slot comes from.
    arena: &'a Arena,
    /// Record layout for `(K, V)`.
    layout: SlotLayout<K, V>,
    /// Current bucket array.
    buckets: Allocation,
    /// Number of bucket slots in `buckets`.
    bucket_count: usize,
    /// Live entries.
    len: usize,
    /// `len` at which the next `set` grows the table.
    threshold: usize,
    /// Overflow slots linked into the current bucket array's chains.
    overflow_slots: usize,
    /// Sizing parameters.
    config: TableConfig,
    /// Hash builder.
    hasher: S,
}

impl<'a, K, V> HashTable<'a, K, V>
where
    K: Pod + Eq + Hash,
    V: Pod,
{
    /// Creates a table with 256 buckets, load factor 0.7 and growth x4.
    ///
    /// # Errors
    ///
    /// - [`PoolError::UnsupportedLayout`] if `K` or `V` is over-aligned
    /// - [`PoolError::OutOfMemory`] if the bucket array cannot be allocated
    pub fn new(arena: &'a Arena) -> PoolResult<Self> {
        Self::with_config(arena, TableConfig::default())
    }

    /// Creates a table with explicit sizing.
    ///
    /// # Errors
    ///
    /// Same as [`HashTable::new`], plus [`PoolError::InvalidConfig`] if the
    /// configuration does not validate.
    pub fn with_config(arena: &'a Arena, config: TableConfig) -> PoolResult<Self> {
        Self::with_config_and_hasher(arena, config, DefaultBuildHasher::default())
    }
}

impl<'a, K, V, S> HashTable<'a, K, V, S>
where
    K: Pod + Eq + Hash,
    V: Pod,
    S: BuildHasher,
{
    /// Creates a table with default sizing and a custom hasher.
    ///
    /// # Errors
    ///
    /// Same as [`HashTable::new`].
    pub fn with_hasher(arena: &'a Arena, hasher: S) -> PoolResult<Self> {
        Self::with_config_and_hasher(arena, TableConfig::default(), hasher)
    }

    /// Creates a table with explicit sizing and a custom hasher.
    ///
    /// # Errors
    ///
    /// Same as [`HashTable::with_config`].
    pub fn with_config_and_hasher(
        arena: &'a Arena,
        config: TableConfig,
        hasher: S,
    ) -> PoolResult<Self> {
        config.validate()?;
        let layout = SlotLayout::new()?;
        let buckets = Self::allocate_buckets(arena, &layout, config.initial_buckets)?;

        Ok(Self {
            arena,
            layout,
            buckets,
            bucket_count: config.initial_buckets,
            len: 0,
            threshold: config.grow_threshold(config.initial_buckets),
            overflow_slots: 0,
            config,
            hasher,
        })
    }

    /// Returns the number of live entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the table holds no live entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of buckets.
    #[inline]
    #[must_use]
    pub const fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Returns the entry count at which the next `set` grows the table.
    #[inline]
    #[must_use]
    pub const fn grow_threshold(&self) -> usize {
        self.threshold
    }

    /// Returns the number of physical slots: bucket slots plus overflow
    /// slots, live or not.
    #[inline]
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        self.bucket_count + self.overflow_slots
    }

    /// Returns a copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.find_slot(key)?;
        let record = self.arena.bytes(&slot);
        Some(self.layout.value(&record))
    }

    /// Returns true if `key` has a live entry.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.find_slot(key).is_some()
    }

    /// Applies `mutator` to the value stored under `key`, in place.
    ///
    /// Returns false, without calling `mutator`, if the key is absent.
    pub fn update<F>(&mut self, key: &K, mutator: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let Some(slot) = self.find_slot(key) else {
            return false;
        };

        let mut value = self.layout.value(&self.arena.bytes(&slot));
        mutator(&mut value);
        self.layout
            .write_value(&mut self.arena.bytes_mut(&slot), &value);
        true
    }

    /// Inserts `value` under `key`, overwriting any previous value.
    ///
    /// Grows the table first if it has reached its load factor. An overwrite
    /// consumes no new slot and leaves `len` unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfMemory`] if the arena cannot supply a
    /// bucket array or overflow slot. The table is unchanged in that case.
    pub fn set(&mut self, key: K, value: V) -> PoolResult<()> {
        if self.len >= self.threshold {
            self.grow()?;
        }

        let placement = self.place(&self.buckets, self.bucket_count, &key, &value)?;
        match placement {
            Placement::Overwritten => {}
            Placement::Reused => self.len += 1,
            Placement::Appended => {
                self.len += 1;
                self.overflow_slots += 1;
            }
        }
        Ok(())
    }

    /// Removes the entry stored under `key`.
    ///
    /// The slot is cleared and stays linked in its chain for reuse.
    /// Returns false if the key was absent.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(slot) = self.find_slot(key) else {
            return false;
        };

        self.layout.clear_entry(&mut self.arena.bytes_mut(&slot));
        self.len -= 1;
        true
    }

    /// Iterates over live `(key, value)` pairs in bucket order.
    ///
    /// The order is a function of hashing and insertion order, not a
    /// contract.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, 'a, K, V, S> {
        Iter {
            table: self,
            bucket: 0,
            slot: None,
        }
    }

    /// Iterates over live keys.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates over live values.
    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    fn allocate_buckets(
        arena: &Arena,
        layout: &SlotLayout<K, V>,
        count: usize,
    ) -> PoolResult<Allocation> {
        let bytes = count
            .checked_mul(layout.stride())
            .ok_or(PoolError::OutOfMemory {
                requested: usize::MAX,
            })?;
        arena.allocate_block_zeroed(bytes, layout.align())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn bucket_of(&self, key: &K, bucket_count: usize) -> usize {
        (self.hasher.hash_one(key) % bucket_count as u64) as usize
    }

    /// Walks the key's chain and returns its live slot.
    fn find_slot(&self, key: &K) -> Option<Allocation> {
        let stride = self.layout.stride();
        let mut cursor = Some(
            self.layout
                .slot_at(&self.buckets, self.bucket_of(key, self.bucket_count)),
        );

        while let Some(slot) = cursor {
            let record = self.arena.bytes(&slot);
            let header = self.layout.header(&record);
            if header.is_used() && self.layout.key(&record) == *key {
                return Some(slot);
            }
            cursor = header.next(stride);
        }
        None
    }

    /// Inserts into the given bucket array: overwrite an equal live key,
    /// else fill the first unused slot of the chain, else append a new
    /// overflow slot after the tail.
    fn place(
        &self,
        buckets: &Allocation,
        bucket_count: usize,
        key: &K,
        value: &V,
    ) -> PoolResult<Placement> {
        let stride = self.layout.stride();
        let head = self
            .layout
            .slot_at(buckets, self.bucket_of(key, bucket_count));

        let mut cursor = Some(head);
        let mut tail = head;
        let mut vacant = None;

        while let Some(slot) = cursor {
            let (header, matches) = {
                let record = self.arena.bytes(&slot);
                let header = self.layout.header(&record);
                let matches = header.is_used() && self.layout.key(&record) == *key;
                (header, matches)
            };

            if matches {
                self.layout
                    .write_value(&mut self.arena.bytes_mut(&slot), value);
                return Ok(Placement::Overwritten);
            }
            if !header.is_used() && vacant.is_none() {
                vacant = Some(slot);
            }
            tail = slot;
            cursor = header.next(stride);
        }

        if let Some(slot) = vacant {
            self.layout
                .write_entry(&mut self.arena.bytes_mut(&slot), key, value);
            return Ok(Placement::Reused);
        }

        let slot = self
            .arena
            .allocate_block_zeroed(stride, self.layout.align())?;
        self.layout
            .write_entry(&mut self.arena.bytes_mut(&slot), key, value);
        self.layout.link(&mut self.arena.bytes_mut(&tail), &slot);
        Ok(Placement::Appended)
    }

    /// Rebuilds the table with `growth_factor` times more buckets.
    ///
    /// The new array starts tombstone-free. The old array and its overflow
    /// slots are abandoned in the arena.
    fn grow(&mut self) -> PoolResult<()> {
        let stride = self.layout.stride();
        let new_count = self
            .bucket_count
            .checked_mul(self.config.growth_factor)
            .ok_or(PoolError::OutOfMemory {
                requested: usize::MAX,
            })?;
        let new_buckets = Self::allocate_buckets(self.arena, &self.layout, new_count)?;

        let mut moved = 0;
        let mut overflow = 0;
        for bucket in 0..self.bucket_count {
            let mut cursor = Some(self.layout.slot_at(&self.buckets, bucket));
            while let Some(slot) = cursor {
                let (header, entry) = {
                    let record = self.arena.bytes(&slot);
                    let header = self.layout.header(&record);
                    let entry = header
                        .is_used()
                        .then(|| (self.layout.key(&record), self.layout.value(&record)));
                    (header, entry)
                };

                if let Some((key, value)) = entry {
                    match self.place(&new_buckets, new_count, &key, &value)? {
                        Placement::Overwritten => {}
                        Placement::Reused => moved += 1,
                        Placement::Appended => {
                            moved += 1;
                            overflow += 1;
                        }
                    }
                }
                cursor = header.next(stride);
            }
        }

        tracing::debug!(
            old_buckets = self.bucket_count,
            new_buckets = new_count,
            entries = moved,
            "hash table grown"
        );

        self.arena.release(&self.buckets);
        self.buckets = new_buckets;
        self.bucket_count = new_count;
        self.len = moved;
        self.overflow_slots = overflow;
        self.threshold = self.config.grow_threshold(new_count);
        Ok(())
    }
}

/// Iterator over the live entries of a [`HashTable`].
///
/// Position is (bucket index, current slot); the iterator is exhausted once
/// the bucket index reaches the bucket count. It borrows the table, so the
/// table cannot be modified mid-scan.
pub struct Iter<'t, 'a, K, V, S> {
    table: &'t HashTable<'a, K, V, S>,
    /// Next bucket whose chain has not been entered yet.
    bucket: usize,
    /// Next slot to inspect in the current chain.
    slot: Option<Allocation>,
}

impl<'t, 'a, K, V, S> Iterator for Iter<'t, 'a, K, V, S>
where
    K: Pod + Eq + Hash,
    V: Pod,
    S: BuildHasher,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table;
        loop {
            let slot = match self.slot.take() {
                Some(slot) => slot,
                None => {
                    if self.bucket >= table.bucket_count {
                        return None;
                    }
                    let head = table.layout.slot_at(&table.buckets, self.bucket);
                    self.bucket += 1;
                    head
                }
            };

            let record = table.arena.bytes(&slot);
            let header = table.layout.header(&record);
            self.slot = header.next(table.layout.stride());
            if header.is_used() {
                return Some((table.layout.key(&record), table.layout.value(&record)));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.table.len))
    }
}

impl<'t, 'a, K, V, S> IntoIterator for &'t HashTable<'a, K, V, S>
where
    K: Pod + Eq + Hash,
    V: Pod,
    S: BuildHasher,
{
    type Item = (K, V);
    type IntoIter = Iter<'t, 'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
