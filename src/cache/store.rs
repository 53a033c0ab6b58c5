//! Durable string-keyed stores backing the analysis cache
//!
//! `MemoryStore` is the native/test store and can simulate a storage quota.
//! `LocalStorageStore` wraps the browser's `localStorage`.

use std::collections::HashMap;

use crate::error::CacheError;

/// Best-effort durable key/value store. Writes may fail; reads never do.
pub trait CacheStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove(&mut self, key: &str);
}

impl<S: CacheStore + ?Sized> CacheStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key)
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store with an optional byte capacity (keys + values)
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses writes once `bytes` would be exceeded
    pub fn with_capacity_bytes(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: Some(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        if let Some(capacity) = self.capacity {
            let replaced = self.entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let used = self.used_bytes() - replaced;
            let needed = key.len() + value.len();
            if used + needed > capacity {
                return Err(CacheError::Quota {
                    needed,
                    available: capacity.saturating_sub(used),
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

// =============================================================================
// LocalStorageStore
// =============================================================================

/// Browser `localStorage`. Only usable on wasm32 inside a window context.
pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

impl LocalStorageStore {
    pub fn open() -> Result<Self, CacheError> {
        let window = web_sys::window().ok_or_else(|| CacheError::Unavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| CacheError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| CacheError::Unavailable("no localStorage".to_string()))?;
        Ok(Self { storage })
    }
}

impl CacheStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        // Browsers raise QuotaExceededError here; all failures are treated alike
        self.storage
            .set_item(key, value)
            .map_err(|e| CacheError::Unavailable(format!("{:?}", e)))
    }

    fn remove(&mut self, key: &str) {
        let _ = self.storage.remove_item(key);
    }
}
