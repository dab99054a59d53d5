//! Metadata comparison.
//!
//! Metadata is an unordered map of free-form string pairs attached to
//! destinations, clusters and routes. It is passed through to consumers
//! untouched, but it takes part in configuration identity.
//!
//! # Design Decisions
//! - Keys and values compare exactly (case-sensitive)
//! - An absent map and an empty map are the same configuration: both mean
//!   "no metadata", for equality and hashing alike
//! - Hashing sums per-entry hashes, so insertion order never matters

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Free-form key/value pairs.
pub type Metadata = HashMap<String, String>;

/// Compare two optional metadata maps.
pub fn equals(a: Option<&Metadata>, b: Option<&Metadata>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
        }
        (Some(map), None) | (None, Some(map)) => map.is_empty(),
        (None, None) => true,
    }
}

/// Feed an order-independent hash of an optional metadata map.
pub fn hash<H: Hasher>(metadata: Option<&Metadata>, state: &mut H) {
    let (count, sum) = match metadata {
        Some(map) => (
            map.len(),
            map.iter()
                .fold(0u64, |acc, (k, v)| acc.wrapping_add(entry_hash(k, v))),
        ),
        None => (0, 0),
    };
    state.write_usize(count);
    state.write_u64(sum);
}

// Fixed-key hasher so every entry hashes the same regardless of the outer state.
fn entry_hash(key: &str, value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    value.hash(&mut hasher);
    hasher.finish()
}
