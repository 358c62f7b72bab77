//! Pooled slot allocator for triangle and subsegment records.
//!
//! Records are addressed by integer slot index, which keeps the cyclic mesh
//! graph (triangles pointing at neighbors pointing back) free of ownership
//! cycles. Slot 0 always holds the pool's *sentinel*: a record that stands in
//! for "outer space" or "no constraint" and is never considered alive.
//!
//! # Storage
//!
//! Slots live in a list of blocks whose capacities double (`B, 2B, 4B, ...`),
//! so growth is geometric and existing slots never move. Freed slots are kept
//! on a free list and handed out again before the high-water mark advances.
//!
//! # Sampling
//!
//! [`Pool::sample`] draws uniformly random slot indices and yields the live
//! ones. The expected cost per live sample is the inverse of the live fraction,
//! which stays bounded because freed slots are recycled first.

use rand::Rng;
use std::ops::{Index, IndexMut};

/// Default capacity of the first block.
pub const DEFAULT_FIRST_BLOCK: usize = 1024;

#[derive(Clone, Debug)]
struct Slot<T> {
    item: T,
    alive: bool,
}

/// A block-list allocator with a free list and a permanent sentinel at slot 0.
#[derive(Clone, Debug)]
pub struct Pool<T> {
    blocks: Vec<Vec<Slot<T>>>,
    first_block: usize,
    high_water: usize,
    free: Vec<usize>,
    live: usize,
}

impl<T> Pool<T> {
    /// Creates a pool holding only `sentinel`, with the default first block size.
    pub fn new(sentinel: T) -> Self {
        Self::with_first_block(sentinel, DEFAULT_FIRST_BLOCK)
    }

    /// Creates a pool whose first block holds `first_block` slots.
    pub fn with_first_block(sentinel: T, first_block: usize) -> Self {
        let first_block = first_block.max(2);
        let mut block = Vec::with_capacity(first_block);
        block.push(Slot {
            item: sentinel,
            alive: false,
        });
        Self {
            blocks: vec![block],
            first_block,
            high_water: 1,
            free: Vec::new(),
            live: 0,
        }
    }

    /// Maps a global slot index to `(block, offset)`.
    ///
    /// Block `k` covers indices `[B(2^k - 1), B(2^(k+1) - 1))`.
    #[inline]
    fn position(&self, index: usize) -> (usize, usize) {
        let b = self.first_block;
        let k = (index / b + 1).ilog2() as usize;
        let start = b * ((1_usize << k) - 1);
        (k, index - start)
    }

    #[inline]
    fn slot(&self, index: usize) -> &Slot<T> {
        let (block, offset) = self.position(index);
        &self.blocks[block][offset]
    }

    #[inline]
    fn slot_mut(&mut self, index: usize) -> &mut Slot<T> {
        let (block, offset) = self.position(index);
        &mut self.blocks[block][offset]
    }

    /// Stores `item` in a recycled slot if one is free, otherwise in a fresh one.
    pub fn alloc(&mut self, item: T) -> usize {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = self.slot_mut(index);
            slot.item = item;
            slot.alive = true;
            return index;
        }
        let index = self.high_water;
        let (block, _) = self.position(index);
        if block == self.blocks.len() {
            self.blocks
                .push(Vec::with_capacity(self.first_block << block));
        }
        self.blocks[block].push(Slot { item, alive: true });
        self.high_water += 1;
        index
    }

    /// Marks the slot dead and returns it to the free list.
    ///
    /// Freeing the sentinel or an already dead slot is a caller bug.
    pub fn dealloc(&mut self, index: usize) {
        debug_assert!(index != 0, "the sentinel slot is never freed");
        debug_assert!(self.is_alive(index), "double free of pool slot {index}");
        self.slot_mut(index).alive = false;
        self.free.push(index);
        self.live -= 1;
    }

    /// Returns `true` if `index` holds a live record. The sentinel is never alive.
    #[must_use]
    pub fn is_alive(&self, index: usize) -> bool {
        index < self.high_water && self.slot(index).alive
    }

    /// Number of live records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no record is alive.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever handed out, including the sentinel and dead slots.
    #[must_use]
    pub const fn high_water(&self) -> usize {
        self.high_water
    }

    /// Number of allocated blocks.
    #[must_use]
    pub const fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Iterates over live records as `(index, record)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.blocks
            .iter()
            .flatten()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| (index, &slot.item))
    }

    /// Collects the indices of all live records.
    #[must_use]
    pub fn live_indices(&self) -> Vec<usize> {
        self.iter().map(|(index, _)| index).collect()
    }

    /// Draws `attempts` random slot indices and returns the live ones.
    pub fn sample<R: Rng>(&self, rng: &mut R, attempts: usize) -> Vec<usize> {
        if self.high_water <= 1 {
            return Vec::new();
        }
        (0..attempts)
            .map(|_| rng.random_range(1..self.high_water))
            .filter(|&index| self.slot(index).alive)
            .collect()
    }

    /// Drops every record and reinstalls `sentinel` at slot 0.
    pub fn clear(&mut self, sentinel: T) {
        self.blocks.truncate(1);
        self.blocks[0].clear();
        self.blocks[0].push(Slot {
            item: sentinel,
            alive: false,
        });
        self.high_water = 1;
        self.free.clear();
        self.live = 0;
    }
}

impl<T> Index<usize> for Pool<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.slot(index).item
    }
}

impl<T> IndexMut<usize> for Pool<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.slot_mut(index).item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sentinel_is_never_alive() {
        let pool: Pool<u32> = Pool::new(7);
        assert_eq!(pool[0], 7);
        assert!(!pool.is_alive(0));
        assert!(pool.is_empty());
    }

    #[test]
    fn freed_slots_are_recycled_first() {
        let mut pool = Pool::with_first_block(0_u32, 4);
        let a = pool.alloc(1);
        let b = pool.alloc(2);
        assert_eq!((a, b), (1, 2));
        pool.dealloc(a);
        assert!(!pool.is_alive(a));
        assert_eq!(pool.len(), 1);
        let c = pool.alloc(3);
        assert_eq!(c, a);
        assert_eq!(pool[c], 3);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn blocks_grow_geometrically_without_moving_slots() {
        let mut pool = Pool::with_first_block(0_usize, 4);
        let indices: Vec<_> = (1..=40).map(|v| pool.alloc(v)).collect();
        // 41 slots (with the sentinel) need blocks of 4, 8, 16 and 32.
        assert_eq!(pool.block_count(), 4);
        for (value, index) in (1..=40).zip(indices) {
            assert_eq!(pool[index], value);
        }
        assert_eq!(pool.iter().count(), 40);
    }

    #[test]
    fn sampling_only_returns_live_slots() {
        let mut pool = Pool::with_first_block(0_u32, 8);
        for v in 0..20 {
            pool.alloc(v);
        }
        for index in (1..21).step_by(2) {
            pool.dealloc(index);
        }
        let mut rng = StdRng::seed_from_u64(42);
        let samples = pool.sample(&mut rng, 100);
        assert!(!samples.is_empty());
        assert!(samples.iter().all(|&i| pool.is_alive(i)));
    }

    #[test]
    fn clear_resets_to_sentinel() {
        let mut pool = Pool::with_first_block(0_u32, 2);
        for v in 0..10 {
            pool.alloc(v);
        }
        pool.clear(9);
        assert!(pool.is_empty());
        assert_eq!(pool.high_water(), 1);
        assert_eq!(pool[0], 9);
        assert_eq!(pool.alloc(5), 1);
    }
}
