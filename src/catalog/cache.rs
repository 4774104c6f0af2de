//! Per-version catalog cache.
//!
//! Published versions are immutable, so a loaded catalog never goes stale.
//! Concurrent first requests for the same version may both load it; the
//! first insert wins and the other copy is dropped. The cache holds at most
//! `capacity` catalogs and drops the least recently used one to make room.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::lookup::MetadataCatalog;
use super::source::CatalogSource;
use super::CatalogResult;
use crate::model::{DataSetVersion, VersionNumber};

/// Catalogs kept when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 64;

type CacheKey = (Uuid, VersionNumber);

struct CacheEntry {
    catalog: Arc<MetadataCatalog>,
    last_used: AtomicU64,
}

pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    entries: DashMap<CacheKey, CacheEntry>,
    capacity: usize,
    clock: AtomicU64,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self::with_capacity(source, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(source: Arc<dyn CatalogSource>, capacity: usize) -> Self {
        Self {
            source,
            entries: DashMap::new(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
        }
    }

    /// The catalog for `version`, loading it on first use.
    pub async fn get(&self, version: &DataSetVersion) -> CatalogResult<Arc<MetadataCatalog>> {
        let key = (version.data_set_id, version.version);
        if let Some(hit) = self.entries.get(&key) {
            hit.last_used.store(self.tick(), Ordering::Relaxed);
            return Ok(Arc::clone(&hit.catalog));
        }

        let loaded = Arc::new(self.source.load(version).await?);
        self.make_room();
        let entry = self.entries.entry(key).or_insert_with(|| CacheEntry {
            catalog: loaded,
            last_used: AtomicU64::new(self.tick()),
        });
        Ok(Arc::clone(&entry.catalog))
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Evict least recently used entries until one more fits.
    fn make_room(&self) {
        while self.entries.len() >= self.capacity {
            // The iterator's shard locks must be released before removing.
            let oldest = self
                .entries
                .iter()
                .min_by_key(|e| e.last_used.load(Ordering::Relaxed))
                .map(|e| *e.key());
            let Some(key) = oldest else {
                return;
            };
            if self.entries.remove(&key).is_some() {
                tracing::debug!(data_set_id = %key.0, version = %key.1, "evicted catalog");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("entries", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
