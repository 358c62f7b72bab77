//! Collection type aliases used throughout the mesher.
//!
//! Hash-based collections use `rustc-hash`'s `FxHasher`, which is considerably
//! faster than SipHash for the small integer keys (slot indices, vertex keys)
//! used here. Short, bounded lists (a vertex star, a candidate ring) live in
//! [`SmallBuffer`] to stay on the stack.

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

#[cfg(not(feature = "dense-slotmap"))]
use slotmap::SlotMap;

#[cfg(feature = "dense-slotmap")]
use slotmap::DenseSlotMap;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for vertex records.
///
/// # Feature Flags
///
/// - **default**: `DenseSlotMap` (enabled via the default `dense-slotmap` feature)
/// - **--no-default-features**: `SlotMap`
#[cfg(not(feature = "dense-slotmap"))]
pub type StorageMap<K, V> = SlotMap<K, V>;

/// Storage backend for vertex records.
///
/// # Feature Flags
///
/// - **default**: `DenseSlotMap` (enabled via the default `dense-slotmap` feature)
/// - **--no-default-features**: `SlotMap`
#[cfg(feature = "dense-slotmap")]
pub type StorageMap<K, V> = DenseSlotMap<K, V>;

// =============================================================================
// HASHING AND SMALL BUFFERS
// =============================================================================

/// Hash map using the Fx hasher.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Hash set using the Fx hasher.
pub type FastHashSet<T> = FxHashSet<T>;

/// Stack-allocated vector that spills to the heap beyond `N` elements.
///
/// Vertex stars in a quality mesh rarely exceed a dozen triangles, so
/// `SmallBuffer<_, 16>` covers nearly every neighborhood without allocating.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Creates a `FastHashMap` with pre-allocated capacity.
#[inline]
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FxBuildHasher)
}

/// Creates a `FastHashSet` with pre-allocated capacity.
#[inline]
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FxBuildHasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_preallocate() {
        let map = fast_hash_map_with_capacity::<usize, usize>(64);
        assert!(map.capacity() >= 64);
        let set = fast_hash_set_with_capacity::<usize>(32);
        assert!(set.capacity() >= 32);
        let buffer: SmallBuffer<usize, 4> = SmallBuffer::from_slice(&[1, 2, 3]);
        assert!(!buffer.spilled());
    }
}
