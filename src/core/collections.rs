//! Collection aliases tuned for lattice bookkeeping.
//!
//! Incidence lattices are traversed with many small, short-lived index sets
//! and key maps; these aliases pick implementations suited to that workload.

#![forbid(unsafe_code)]

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Hash map keyed by internal identifiers.
///
/// Uses `rustc_hash::FxHasher`, a fast non-cryptographic hasher. Only use
/// with trusted keys (face keys, point indices), never attacker-controlled
/// data.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Hash set counterpart of [`FastHashMap`].
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-size-optimized buffer for adjacency scratch space.
///
/// Faces of practical diagrams have single-digit co-face counts, so `N = 4`
/// or `8` keeps traversal queues off the heap.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;
