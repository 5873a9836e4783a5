//! In-memory diff cache keyed by content fingerprints.
//!
//! Caching is an optimisation only: identical inputs always produce the
//! identical `DiffResult`, so a hit and a recompute are indistinguishable to
//! callers. Keys fingerprint the *content* of both snapshots, never buffer
//! identity, so identical completions in different buffers share entries.
//! Capacity 0 disables the cache without changing semantics.

use crate::util::hash_bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tabstage_core::diff::{self, DiffOptions, DiffResult};

pub struct DiffCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, DiffResult>,
    /// Least-recently-used key at the front.
    order: VecDeque<String>,
}

impl DiffCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("diff cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the diff for this input pair, computing and storing it on a
    /// miss. The lock is held only for lookups and inserts; the diff itself
    /// is computed outside it.
    pub fn get_or_compute(
        &self,
        old_lines: &[String],
        new_lines: &[String],
        options: DiffOptions,
    ) -> DiffResult {
        if self.capacity == 0 {
            return diff::compute_diff_lines(old_lines, new_lines, options);
        }

        let key = fingerprint(old_lines, new_lines, options);
        {
            let mut inner = self.inner.lock().expect("diff cache lock poisoned");
            if let Some(hit) = inner.entries.get(&key).cloned() {
                inner.touch(&key);
                return hit;
            }
        }

        let computed = diff::compute_diff_lines(old_lines, new_lines, options);
        let mut inner = self.inner.lock().expect("diff cache lock poisoned");
        inner.insert(key, computed.clone(), self.capacity);
        computed
    }
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn insert(&mut self, key: String, value: DiffResult, capacity: usize) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key.clone(), value);
            self.touch(&key);
            return;
        }
        while self.entries.len() >= capacity {
            match self.order.pop_front() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }
}

/// Fingerprint both snapshots and the diff options. Line counts and NUL
/// separators keep differently-split inputs from colliding.
fn fingerprint(old_lines: &[String], new_lines: &[String], options: DiffOptions) -> String {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(old_lines.len() as u64).to_le_bytes());
    for line in old_lines {
        buf.extend_from_slice(line.as_bytes());
        buf.push(0);
    }
    buf.extend_from_slice(&(new_lines.len() as u64).to_le_bytes());
    for line in new_lines {
        buf.extend_from_slice(line.as_bytes());
        buf.push(0);
    }
    buf.extend_from_slice(&(options.char_diff_min_common as u64).to_le_bytes());
    hash_bytes(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_cache_hit_matches_direct_computation() {
        let cache = DiffCache::new(8);
        let old = lines(&["a", "b"]);
        let new = lines(&["a", "B!"]);
        let options = DiffOptions::default();

        let first = cache.get_or_compute(&old, &new, options);
        let second = cache.get_or_compute(&old, &new, options);
        assert_eq!(first, second);
        assert_eq!(first, diff::compute_diff_lines(&old, &new, options));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_keys_on_content_not_identity() {
        let cache = DiffCache::new(8);
        let options = DiffOptions::default();
        cache.get_or_compute(&lines(&["a"]), &lines(&["b"]), options);
        // The same content from a different buffer hits the same entry.
        cache.get_or_compute(&lines(&["a"]), &lines(&["b"]), options);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_distinguishes_options() {
        let cache = DiffCache::new(8);
        let old = lines(&["ab"]);
        let new = lines(&["axb"]);
        cache.get_or_compute(&old, &new, DiffOptions::default());
        cache.get_or_compute(
            &old,
            &new,
            DiffOptions {
                char_diff_min_common: 2,
            },
        );
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let cache = DiffCache::new(2);
        let options = DiffOptions::default();
        cache.get_or_compute(&lines(&["1"]), &lines(&["one"]), options);
        cache.get_or_compute(&lines(&["2"]), &lines(&["two"]), options);
        // Touch the first entry so the second becomes least recently used.
        cache.get_or_compute(&lines(&["1"]), &lines(&["one"]), options);
        cache.get_or_compute(&lines(&["3"]), &lines(&["three"]), options);

        assert_eq!(cache.len(), 2);
        // Entry "1" survived the eviction; re-requesting "2" grows the cache
        // back to capacity by evicting again.
        cache.get_or_compute(&lines(&["1"]), &lines(&["one"]), options);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_disables_caching() {
        let cache = DiffCache::new(0);
        let options = DiffOptions::default();
        let result = cache.get_or_compute(&lines(&["a"]), &lines(&["b"]), options);
        assert_eq!(result, diff::compute_diff_lines(&lines(&["a"]), &lines(&["b"]), options));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fingerprint_separates_line_boundaries() {
        let options = DiffOptions::default();
        let a = fingerprint(&lines(&["ab", "c"]), &[], options);
        let b = fingerprint(&lines(&["a", "bc"]), &[], options);
        assert_ne!(a, b);
    }
}
