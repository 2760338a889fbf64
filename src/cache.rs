use bytes::Bytes;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A finished artifact keyed by canonical request signature. Entries are
/// immutable once inserted and only ever created from a complete render;
/// failed renders are never cached.
#[derive(Debug)]
pub struct CacheEntry {
    pub body: Bytes,
    pub content_type: &'static str,
    pub inserted_at: Instant,
    pub size_bytes: usize,
}

impl CacheEntry {
    /// Text artifact (vector markup). Sized at double the character
    /// length, a deliberate wide-character overestimate.
    pub fn text(body: String, content_type: &'static str) -> Self {
        let size_bytes = body.chars().count() * 2;
        Self {
            body: Bytes::from(body),
            content_type,
            inserted_at: Instant::now(),
            size_bytes,
        }
    }

    /// Binary artifact, sized at its byte length.
    pub fn binary(body: Vec<u8>, content_type: &'static str) -> Self {
        let size_bytes = body.len();
        Self {
            body: Bytes::from(body),
            content_type,
            inserted_at: Instant::now(),
            size_bytes,
        }
    }

    fn expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub count: usize,
    pub total_bytes: usize,
}

struct Inner {
    entries: LruCache<String, Arc<CacheEntry>>,
    total_bytes: usize,
}

/// In-memory artifact cache: least-recently-used eviction bounded by both
/// item count and aggregate byte size, plus a fixed time-to-live checked
/// lazily on access. Safe for concurrent use from multiple in-flight
/// requests.
pub struct ImageCache {
    inner: Mutex<Inner>,
    max_items: usize,
    max_bytes: usize,
    ttl: Duration,
}

impl ImageCache {
    pub fn new(max_items: usize, max_bytes: usize, ttl: Duration) -> Self {
        let capacity =
            NonZeroUsize::new(max_items).unwrap_or(NonZeroUsize::new(1000).unwrap());
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                total_bytes: 0,
            }),
            max_items: capacity.get(),
            max_bytes,
            ttl,
        }
    }

    /// Look up a signature, refreshing its recency. An expired entry is
    /// removed and reported as a miss.
    pub fn get(&self, signature: &str) -> Option<Arc<CacheEntry>> {
        let mut inner = self.inner.lock().unwrap();
        let expired = match inner.entries.get(signature) {
            Some(entry) if entry.expired(self.ttl) => true,
            Some(entry) => return Some(Arc::clone(entry)),
            None => return None,
        };
        if expired {
            if let Some(entry) = inner.entries.pop(signature) {
                inner.total_bytes = inner.total_bytes.saturating_sub(entry.size_bytes);
            }
        }
        None
    }

    pub fn has(&self, signature: &str) -> bool {
        self.get(signature).is_some()
    }

    /// Insert a finished artifact, evicting least-recently-used entries
    /// until both bounds hold. An artifact larger than the byte bound by
    /// itself is silently not cached; the caller's response is
    /// unaffected.
    pub fn put(&self, signature: String, entry: CacheEntry) {
        if entry.size_bytes > self.max_bytes {
            return;
        }
        let mut inner = self.inner.lock().unwrap();

        if let Some(old) = inner.entries.pop(&signature) {
            inner.total_bytes = inner.total_bytes.saturating_sub(old.size_bytes);
        }

        while inner.entries.len() + 1 > self.max_items
            || inner.total_bytes + entry.size_bytes > self.max_bytes
        {
            match inner.entries.pop_lru() {
                Some((_, evicted)) => {
                    inner.total_bytes = inner.total_bytes.saturating_sub(evicted.size_bytes);
                }
                None => break,
            }
        }

        inner.total_bytes += entry.size_bytes;
        inner.entries.put(signature, Arc::new(entry));
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        CacheStats {
            count: inner.entries.len(),
            total_bytes: inner.total_bytes,
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.total_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn binary(len: usize) -> CacheEntry {
        CacheEntry::binary(vec![0u8; len], "image/png")
    }

    #[test]
    fn get_returns_inserted_entry() {
        let cache = ImageCache::new(10, 1024, HOUR);
        cache.put("/a".to_string(), binary(16));
        let entry = cache.get("/a").unwrap();
        assert_eq!(entry.body.len(), 16);
        assert_eq!(entry.content_type, "image/png");
        assert!(cache.has("/a"));
        assert!(!cache.has("/b"));
    }

    #[test]
    fn text_entries_cost_double_their_char_count() {
        let cache = ImageCache::new(10, 1024, HOUR);
        cache.put("/svg".to_string(), CacheEntry::text("<svg/>".to_string(), "image/svg+xml"));
        assert_eq!(cache.stats().total_bytes, 12);
    }

    #[test]
    fn item_count_eviction_is_lru_ordered() {
        let cache = ImageCache::new(2, 1024, HOUR);
        cache.put("/a".to_string(), binary(1));
        cache.put("/b".to_string(), binary(1));
        // Touch /a so /b becomes least recently used.
        cache.get("/a");
        cache.put("/c".to_string(), binary(1));
        assert!(cache.has("/a"));
        assert!(!cache.has("/b"));
        assert!(cache.has("/c"));
    }

    #[test]
    fn byte_bound_evicts_until_it_fits() {
        let cache = ImageCache::new(10, 100, HOUR);
        cache.put("/a".to_string(), binary(40));
        cache.put("/b".to_string(), binary(40));
        cache.put("/c".to_string(), binary(40));
        let stats = cache.stats();
        assert!(stats.total_bytes <= 100);
        assert!(!cache.has("/a"));
        assert!(cache.has("/c"));
    }

    #[test]
    fn oversized_entry_is_not_cached() {
        let cache = ImageCache::new(10, 100, HOUR);
        cache.put("/big".to_string(), binary(101));
        assert!(!cache.has("/big"));
        assert_eq!(cache.stats().count, 0);
    }

    #[test]
    fn reinsert_replaces_and_rebalances_bytes() {
        let cache = ImageCache::new(10, 1024, HOUR);
        cache.put("/a".to_string(), binary(50));
        cache.put("/a".to_string(), binary(20));
        let stats = cache.stats();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.total_bytes, 20);
    }

    #[test]
    fn expired_entry_is_a_miss_and_gets_removed() {
        let cache = ImageCache::new(10, 1024, Duration::from_millis(0));
        cache.put("/a".to_string(), binary(8));
        assert!(cache.get("/a").is_none());
        assert_eq!(cache.stats().count, 0);
    }

    #[test]
    fn clear_resets_stats() {
        let cache = ImageCache::new(10, 1024, HOUR);
        cache.put("/a".to_string(), binary(8));
        cache.clear();
        assert_eq!(cache.stats(), CacheStats { count: 0, total_bytes: 0 });
    }
}
