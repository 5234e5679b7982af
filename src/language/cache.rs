//! Bounded memo table for language unions
//!
//! Deriving a long-lived rule set regenerates the same unions on every
//! step. The table is keyed by the ordered operand pair (structural hash
//! plus structural equality) and evicts least recently used entries.

use super::Language;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of cached unions
pub const DEFAULT_CAPACITY: usize = 4096;

lazy_static::lazy_static! {
    static ref UNION_CACHE: Mutex<LruCache<(Language, Language), Language>> = Mutex::new(
        LruCache::new(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    );
}

static HITS: AtomicU64 = AtomicU64::new(0);
static MISSES: AtomicU64 = AtomicU64::new(0);

/// Snapshot of union cache usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the table
    pub hits: u64,
    /// Lookups that had to build the union
    pub misses: u64,
    /// Entries currently held
    pub len: usize,
    /// Maximum number of entries
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the table
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub(super) fn union(left: &Language, right: &Language) -> Language {
    let key = (left.clone(), right.clone());
    if let Some(hit) = UNION_CACHE.lock().get(&key) {
        HITS.fetch_add(1, Ordering::Relaxed);
        return hit.clone();
    }

    MISSES.fetch_add(1, Ordering::Relaxed);
    let result = Language::union_uncached(left, right);
    UNION_CACHE.lock().put(key, result.clone());
    result
}

/// Change the maximum number of cached unions, evicting as needed
pub fn set_union_cache_capacity(capacity: NonZeroUsize) {
    UNION_CACHE.lock().resize(capacity);
}

/// Drop every cached union
pub fn clear_union_cache() {
    UNION_CACHE.lock().clear();
}

/// Current cache usage counters
pub fn union_cache_stats() -> CacheStats {
    let cache = UNION_CACHE.lock();
    CacheStats {
        hits: HITS.load(Ordering::Relaxed),
        misses: MISSES.load(Ordering::Relaxed),
        len: cache.len(),
        capacity: cache.cap().get(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{lit, one_of};

    #[test]
    fn test_repeated_union_is_shared() {
        let a = lit("abc");
        let b = one_of("xyz").one_or_more();
        let first = a.or(&b);
        let second = a.or(&b);
        assert_eq!(first, second);
        assert!(union_cache_stats().hits >= 1);
    }

    #[test]
    fn test_union_is_ordered_pair() {
        let a = lit("left");
        let b = lit("right");
        assert_ne!(a.or(&b), b.or(&a));
        assert!(a.or(&b).matches("left"));
        assert!(b.or(&a).matches("left"));
    }
}
