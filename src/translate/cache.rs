//! In-memory FIFO translation cache.
//! Key: blake3 hash of the length-prefixed (text prefix, src_lang, tgt_lang).
//! Capacity: 50. No TTL; entries live until evicted.
//!
//! Backed by `LruCache`, but reads go through `peek`, so recency never
//! changes after insertion and the eviction victim is always the oldest
//! inserted entry.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use super::{char_prefix, TranslationResult, CACHE_KEY_PREFIX_CHARS};

pub type CacheKey = [u8; 32];

pub struct TranslationCache {
    inner: Mutex<LruCache<CacheKey, TranslationResult>>,
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Compute the cache key from translation parameters.
    /// Only the first 50 characters of `text` take part. Each part is hashed
    /// after its byte length, so no two distinct triples share a key.
    pub fn compute_key(text: &str, src_lang: &str, tgt_lang: &str) -> CacheKey {
        let mut hasher = blake3::Hasher::new();
        for part in [char_prefix(text, CACHE_KEY_PREFIX_CHARS), src_lang, tgt_lang] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        *hasher.finalize().as_bytes()
    }

    /// Look up a cached translation. Does not refresh the entry.
    pub fn get(&self, key: &CacheKey) -> Option<TranslationResult> {
        self.inner.lock().peek(key).cloned()
    }

    /// Insert a translation, evicting the oldest entry when full.
    /// An existing key is overwritten in place and keeps its slot.
    pub fn put(&self, key: CacheKey, value: TranslationResult) {
        let mut cache = self.inner.lock();
        if let Some(slot) = cache.peek_mut(&key) {
            *slot = value;
            return;
        }
        if let Some((_, evicted)) = cache.push(key, value) {
            debug!(
                evicted_len = evicted.main_translation.len(),
                "cache full, evicted oldest entry"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Snapshot of every cached value, oldest first.
    pub fn values(&self) -> Vec<TranslationResult> {
        self.inner.lock().iter().rev().map(|(_, v)| v.clone()).collect()
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(super::MAX_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str) -> TranslationResult {
        TranslationResult {
            main_translation: text.to_string(),
            ..Default::default()
        }
    }

    fn key(i: usize) -> CacheKey {
        TranslationCache::compute_key(&format!("text {i}"), "en", "vi")
    }

    #[test]
    fn evicts_oldest_after_capacity() {
        let cache = TranslationCache::default();
        for i in 1..=51 {
            cache.put(key(i), result(&i.to_string()));
        }
        assert_eq!(cache.len(), 50);
        assert!(cache.get(&key(1)).is_none());
        assert_eq!(cache.get(&key(2)), Some(result("2")));
        assert_eq!(cache.get(&key(51)), Some(result("51")));
    }

    #[test]
    fn reads_do_not_protect_from_eviction() {
        let cache = TranslationCache::new(2);
        cache.put(key(1), result("one"));
        cache.put(key(2), result("two"));
        assert!(cache.get(&key(1)).is_some());
        cache.put(key(3), result("three"));
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.get(&key(2)).is_some());
        assert!(cache.get(&key(3)).is_some());
    }

    #[test]
    fn overwrite_keeps_insertion_slot() {
        let cache = TranslationCache::new(2);
        cache.put(key(1), result("one"));
        cache.put(key(2), result("two"));
        cache.put(key(1), result("uno"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key(1)), Some(result("uno")));
        cache.put(key(3), result("three"));
        assert!(cache.get(&key(1)).is_none());
        assert_eq!(cache.get(&key(2)), Some(result("two")));
    }

    #[test]
    fn key_uses_only_first_fifty_chars() {
        let base = "a".repeat(50);
        let k1 = TranslationCache::compute_key(&format!("{base}xyz"), "en", "vi");
        let k2 = TranslationCache::compute_key(&format!("{base}123"), "en", "vi");
        assert_eq!(k1, k2);
        assert_ne!(k1, TranslationCache::compute_key(&base, "en", "fr"));
        assert_ne!(k1, TranslationCache::compute_key(&base, "auto", "vi"));
    }

    #[test]
    fn key_separates_languages_unambiguously() {
        let a = TranslationCache::compute_key("x", "zh-CN", "vi");
        let b = TranslationCache::compute_key("x-zh", "CN", "vi");
        assert_ne!(a, b);
    }

    #[test]
    fn key_parts_cannot_shift_across_boundaries() {
        let a = TranslationCache::compute_key("a|b", "c", "vi");
        let b = TranslationCache::compute_key("a", "b|c", "vi");
        assert_ne!(a, b);
        assert_ne!(
            TranslationCache::compute_key("a", "b", "c|vi"),
            TranslationCache::compute_key("a", "b|c", "vi")
        );
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let cache = TranslationCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put(key(1), result("one"));
        cache.put(key(2), result("two"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key(2)).is_some());
    }

    #[test]
    fn values_are_oldest_first() {
        let cache = TranslationCache::new(3);
        cache.put(key(1), result("one"));
        cache.put(key(2), result("two"));
        let values = cache.values();
        assert_eq!(values[0], result("one"));
        assert_eq!(values[1], result("two"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
