//! AnalysisCache: content-addressable store of analysis records
//!
//! Keyed by the document fingerprint plus a format version, so a record
//! written by an older build simply misses. Corrupt entries are evicted on
//! read. Write failures are returned but callers treat them as non-fatal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fingerprint::{storage_key, Fingerprint};
use super::store::CacheStore;
use crate::analysis::AnalysisRecord;
use crate::config::AnnotatorConfig;
use crate::error::CacheError;

/// What actually sits in the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub stored_at: DateTime<Utc>,
    pub record: AnalysisRecord,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub failed_writes: u64,
}

pub struct AnalysisCache<S: CacheStore> {
    store: S,
    namespace: String,
    version: u32,
    stats: CacheStats,
}

impl<S: CacheStore> AnalysisCache<S> {
    pub fn new(store: S, config: &AnnotatorConfig) -> Self {
        Self {
            store,
            namespace: config.cache_namespace.clone(),
            version: config.cache_version,
            stats: CacheStats::default(),
        }
    }

    pub fn key_for(&self, fingerprint: &Fingerprint) -> String {
        storage_key(&self.namespace, self.version, fingerprint)
    }

    /// Look up a record. A value that fails to deserialize is evicted and
    /// reported as absent.
    pub fn get(&mut self, fingerprint: &Fingerprint) -> Option<AnalysisRecord> {
        let key = self.key_for(fingerprint);
        let Some(raw) = self.store.get(&key) else {
            self.stats.misses += 1;
            tracing::debug!(%key, "analysis cache miss");
            return None;
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => {
                self.stats.hits += 1;
                tracing::debug!(%key, stored_at = %entry.stored_at, "analysis cache hit");
                Some(entry.record)
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "evicting corrupt analysis cache entry");
                self.store.remove(&key);
                self.stats.evictions += 1;
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Persist a record. On failure the record is still usable by the caller;
    /// only persistence is lost.
    pub fn put(&mut self, fingerprint: &Fingerprint, record: &AnalysisRecord) -> Result<(), CacheError> {
        let key = self.key_for(fingerprint);
        let entry = CacheEntry {
            stored_at: Utc::now(),
            record: record.clone(),
        };
        let result = serde_json::to_string(&entry)
            .map_err(|e| CacheError::Serialize(e.to_string()))
            .and_then(|json| self.store.set(&key, &json));

        if result.is_err() {
            self.stats.failed_writes += 1;
        }
        result
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Hit rate as percentage
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.stats.hits + self.stats.misses;
        if lookups == 0 {
            return 0.0;
        }
        (self.stats.hits as f64 / lookups as f64) * 100.0
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{KeywordEntry, PersonEntry, SectionEntry};
    use crate::cache::MemoryStore;

    fn full_record() -> AnalysisRecord {
        AnalysisRecord {
            summary: "A study of convolutional networks.".into(),
            sections: vec![SectionEntry::new("1. Introduction", "Sets the scene.")],
            keywords: vec![KeywordEntry::new("CNN", "A convolutional neural network.")],
            people: vec![PersonEntry::new("Jane Roe", "Lead author.")],
            emails: vec!["jane@example.org".into()],
        }
    }

    fn cache() -> AnalysisCache<MemoryStore> {
        AnalysisCache::new(MemoryStore::new(), &AnnotatorConfig::default())
    }

    // -------------------------------------------------------------------------
    // Requirement 1: put then get round-trips the record
    // -------------------------------------------------------------------------
    #[test]
    fn test_round_trip() {
        let mut cache = cache();
        let fp = Fingerprint::of("document text");
        cache.put(&fp, &full_record()).unwrap();
        assert_eq!(cache.get(&fp), Some(full_record()));
        assert_eq!(cache.stats().hits, 1);
    }

    // -------------------------------------------------------------------------
    // Requirement 2: unknown fingerprint misses
    // -------------------------------------------------------------------------
    #[test]
    fn test_miss() {
        let mut cache = cache();
        assert!(cache.get(&Fingerprint::of("never stored")).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    // -------------------------------------------------------------------------
    // Requirement 3: corrupt entry reads as absent and is evicted
    // -------------------------------------------------------------------------
    #[test]
    fn test_corrupt_entry_evicted() {
        let mut cache = cache();
        let fp = Fingerprint::of("document text");
        cache.put(&fp, &full_record()).unwrap();

        let key = cache.key_for(&fp);
        cache.store_mut().set(&key, "{\"stored_at\": garbage").unwrap();

        assert!(cache.get(&fp).is_none());
        assert!(cache.store().get(&key).is_none());
        assert_eq!(cache.stats().evictions, 1);
    }

    // -------------------------------------------------------------------------
    // Requirement 4: a different format version misses without crashing
    // -------------------------------------------------------------------------
    #[test]
    fn test_version_bump_misses() {
        let fp = Fingerprint::of("document text");
        let mut old = cache();
        old.put(&fp, &full_record()).unwrap();

        let config = AnnotatorConfig { cache_version: 4, ..AnnotatorConfig::default() };
        let mut newer = AnalysisCache::new(old.store().clone(), &config);
        assert!(newer.get(&fp).is_none());
    }

    // -------------------------------------------------------------------------
    // Requirement 5: quota failure is reported, not thrown
    // -------------------------------------------------------------------------
    #[test]
    fn test_put_failure_reported() {
        let mut cache = AnalysisCache::new(MemoryStore::with_capacity_bytes(16), &AnnotatorConfig::default());
        let fp = Fingerprint::of("document text");

        let result = cache.put(&fp, &full_record());
        assert!(matches!(result, Err(CacheError::Quota { .. })));
        assert_eq!(cache.stats().failed_writes, 1);
        assert!(cache.get(&fp).is_none());
    }

    #[test]
    fn test_hit_rate() {
        let mut cache = cache();
        let fp = Fingerprint::of("doc");
        cache.get(&fp);
        cache.put(&fp, &full_record()).unwrap();
        cache.get(&fp);
        cache.get(&fp);
        cache.get(&fp);
        assert!((cache.hit_rate() - 75.0).abs() < 0.01);
    }
}
