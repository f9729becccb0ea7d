//! Hashing utilities for cache keys

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Compute a hash for any hashable value
pub fn compute_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Content hash of a resolved URL, used as the default cache key
///
/// Rendered as fixed-width hex so keys stay filesystem and redis safe.
pub fn url_cache_key(url: &str) -> String {
    format!("{:016x}", compute_hash(url))
}
