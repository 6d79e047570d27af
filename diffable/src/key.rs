use core::hash::{Hash, Hasher};

#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use rustc_hash::FxBuildHasher;
#[cfg(feature = "std")]
use std::collections::HashMap;

/// Lookup table keyed by section or item identity.
///
/// Never iterated when producing output, so its ordering has no effect on results.
#[cfg(feature = "std")]
pub type IdMap<K, V> = HashMap<K, V, FxBuildHasher>;
#[cfg(not(feature = "std"))]
pub type IdMap<K, V> = BTreeMap<K, V>;

/// Marker trait for section and item identifiers.
///
/// With `std`, identifiers are hashed; without it, lookup tables fall back to ordered maps.
#[cfg(feature = "std")]
pub trait Identifier: Hash + Eq + Clone + core::fmt::Debug {}
#[cfg(feature = "std")]
impl<T: Hash + Eq + Clone + core::fmt::Debug> Identifier for T {}

#[cfg(not(feature = "std"))]
pub trait Identifier: Ord + Clone + core::fmt::Debug {}
#[cfg(not(feature = "std"))]
impl<T: Ord + Clone + core::fmt::Debug> Identifier for T {}

pub(crate) fn id_map<K: Identifier, V>(capacity: usize) -> IdMap<K, V> {
    #[cfg(feature = "std")]
    {
        HashMap::with_capacity_and_hasher(capacity, FxBuildHasher)
    }
    #[cfg(not(feature = "std"))]
    {
        let _ = capacity;
        BTreeMap::new()
    }
}

/// Computes a content fingerprint for an item's displayed value.
///
/// Attach it with [`crate::Snapshot::set_content`]; the differ reports a reload when the
/// fingerprint of an item changes between two snapshots.
pub fn fingerprint<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}
