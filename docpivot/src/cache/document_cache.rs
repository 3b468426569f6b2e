//! Staleness-aware document cache.
//!
//! Entries are keyed by path and remember the [`FileIdentity`] the document
//! was built from. Every lookup re-stats the file; an entry whose identity no
//! longer matches is evicted and reported as a miss.
//!
//! # Concurrency
//!
//! The map is a `DashMap`, so lookups and stores for different paths don't
//! contend and each per-path operation is atomic. Eviction is
//! compare-and-remove: only the exact stale entry that was observed is
//! removed, so a fresh entry stored concurrently by another loader survives.
//!
//! The cache is unbounded; use [`DocumentCache::clear`] to drop everything.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use super::identity::{FileIdentity, FileSystem};
use crate::document::DoclingDocument;

/// A cached document and the file identity it was built from.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub identity: FileIdentity,
    pub document: Arc<DoclingDocument>,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped because the file changed or vanished.
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups served from cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Shared cache of built documents.
pub struct DocumentCache {
    entries: DashMap<PathBuf, CacheEntry>,
    fs: Arc<dyn FileSystem>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl DocumentCache {
    /// Create an empty cache that stats files through `fs`.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            entries: DashMap::new(),
            fs,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Return the cached document if the file on disk is unchanged.
    ///
    /// A failed stat (e.g. the file was deleted) counts as a miss and evicts
    /// the entry; the error itself surfaces later, from the reload.
    pub fn lookup(&self, path: &Path) -> Option<Arc<DoclingDocument>> {
        let cached = match self.entries.get(path) {
            Some(entry) => entry.value().clone(),
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let current = match FileIdentity::current(self.fs.as_ref(), path) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "Cache re-stat failed, treating as miss"
                );
                self.evict_if_unchanged(path, &cached.identity);
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if current == cached.identity {
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(cached.document)
        } else {
            tracing::debug!(
                path = %path.display(),
                cached_size = cached.identity.size_bytes,
                current_size = current.size_bytes,
                "Cached document is stale"
            );
            self.evict_if_unchanged(path, &cached.identity);
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Insert or replace the entry for `identity.path`.
    pub fn store(&self, identity: FileIdentity, document: Arc<DoclingDocument>) {
        let path = identity.path.clone();
        self.entries.insert(path, CacheEntry { identity, document });
    }

    /// Remove the entry for `path` only if it still carries `stale`.
    fn evict_if_unchanged(&self, path: &Path, stale: &FileIdentity) {
        if self
            .entries
            .remove_if(path, |_, entry| entry.identity == *stale)
            .is_some()
        {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove the entry for `path`, if any.
    pub fn remove(&self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of entries, stale or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache")
            .field("entries", &self.entries.len())
            .field("stats", &self.stats())
            .finish()
    }
}
