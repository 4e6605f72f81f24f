//! Bounded cache of document headers keyed by document id.
//!
//! Headers arrive alongside webhook replies and are reused when a later
//! reply for the same document omits one. In-memory only — intentionally
//! resets on restart.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

pub const DEFAULT_HEADER_ENTRIES: usize = 256;

/// LRU map from document id to the raw (unescaped) header text. Values
/// are escaped at response-build time, not here, so a tightened escape
/// rule applies to cached entries too.
pub struct HeaderCache {
    entries: Mutex<LruCache<String, String>>,
}

impl HeaderCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Looks up the header for a document, refreshing its recency.
    pub fn get(&self, document_id: &str) -> Option<String> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.get(document_id).cloned()
    }

    /// Records a header, evicting the least recently used entry when full.
    pub fn insert(&self, document_id: String, header: String) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.put(document_id, header);
    }

    pub fn len(&self) -> usize {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HeaderCache {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_ENTRIES)
    }
}

impl std::fmt::Debug for HeaderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
