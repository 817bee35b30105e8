// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page cache: LRU bounded by entry count and by estimated decoded bytes.
//
// Owned by exactly one `DocumentHandle`; callers serialise access through
// `&mut self`. `put` never refuses an image: an entry larger than the byte
// budget is kept until the next insertion pushes it out.

use std::sync::Arc;

use image::DynamicImage;
use lru::LruCache;
use tracing::{debug, trace};

use crate::image::estimated_bytes;

/// Decoded page shared between the cache and its callers.
pub type PageImage = Arc<DynamicImage>;

/// Usage at or above this share of `max_bytes` triggers a reclaim pass.
const HOT_THRESHOLD: f64 = 0.80;
/// A reclaim pass trims usage down to this share of `max_bytes`.
const RECLAIM_TARGET: f64 = 0.70;

/// Limits applied after every insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub max_items: usize,
    pub max_bytes: usize,
}

impl Default for CacheLimits {
    /// 20 pages or 512 MiB, whichever is reached first.
    fn default() -> Self {
        Self {
            max_items: 20,
            max_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub items: usize,
    pub bytes: usize,
    pub max_items: usize,
    pub max_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub reclaims: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

struct Entry {
    image: PageImage,
    bytes: usize,
}

/// LRU page cache keyed by 1-based page number.
pub struct PageCache {
    entries: LruCache<u32, Entry>,
    limits: CacheLimits,
    bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    reclaims: u64,
}

impl PageCache {
    pub fn new(limits: CacheLimits) -> Self {
        let limits = CacheLimits {
            max_items: limits.max_items.max(1),
            max_bytes: limits.max_bytes,
        };
        Self {
            entries: LruCache::unbounded(),
            limits,
            bytes: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            reclaims: 0,
        }
    }

    /// Look up a page; a hit becomes most recently used.
    pub fn get(&mut self, key: u32) -> Option<PageImage> {
        match self.entries.get(&key) {
            Some(entry) => {
                self.hits += 1;
                Some(Arc::clone(&entry.image))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Whether `key` is cached, without touching recency.
    pub fn contains(&self, key: u32) -> bool {
        self.entries.contains(&key)
    }

    /// Insert or replace a page, then enforce both limits.
    pub fn put(&mut self, key: u32, image: PageImage) {
        let bytes = estimated_bytes(&image);
        if let Some(previous) = self.entries.put(key, Entry { image, bytes }) {
            self.bytes -= previous.bytes;
        }
        self.bytes += bytes;
        trace!(key, bytes, total = self.bytes, "page cached");

        while self.entries.len() > 1
            && (self.entries.len() > self.limits.max_items || self.bytes > self.limits.max_bytes)
        {
            self.evict_lru();
        }

        if self.is_hot() {
            self.reclaim();
        }
    }

    /// Drop every entry. Counters survive.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aggregate estimated bytes of the cached pages.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            items: self.entries.len(),
            bytes: self.bytes,
            max_items: self.limits.max_items,
            max_bytes: self.limits.max_bytes,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            reclaims: self.reclaims,
        }
    }

    // -- Eviction -------------------------------------------------------------

    fn is_hot(&self) -> bool {
        self.bytes as f64 >= self.limits.max_bytes as f64 * HOT_THRESHOLD
    }

    /// Trim least recently used pages down to the reclaim target, keeping the
    /// most recent one.
    fn reclaim(&mut self) {
        let target = (self.limits.max_bytes as f64 * RECLAIM_TARGET) as usize;
        let before = self.bytes;
        while self.entries.len() > 1 && self.bytes > target {
            self.evict_lru();
        }
        if self.bytes < before {
            self.reclaims += 1;
            debug!(before, after = self.bytes, target, "page cache reclaimed");
        }
    }

    fn evict_lru(&mut self) {
        if let Some((key, entry)) = self.entries.pop_lru() {
            self.bytes -= entry.bytes;
            self.evictions += 1;
            trace!(key, bytes = entry.bytes, "page evicted");
        }
    }
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache").field("stats", &self.stats()).finish()
    }
}
