use std::sync::Arc;

use collab_core::SearchResult;

use crate::{write_json, KeyValueStore, StoreError};

const CACHE_PREFIX: &str = "bcf_results_cache_";

/// Last outcome per searched domain, replayed instead of re-querying.
#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn KeyValueStore>,
}

fn cache_key(domain: &str) -> String {
    format!("{CACHE_PREFIX}{}", domain.to_lowercase())
}

impl SessionCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cached entry for `domain`; unreadable entries count as a miss.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn get(&self, domain: &str) -> Result<Option<SearchResult>, StoreError> {
        let key = cache_key(domain);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(domain, error = %e, "cached result unreadable, ignoring");
                Ok(None)
            }
        }
    }

    /// Store `entry` for `domain`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if serialization or the backing store fails.
    pub fn put(&self, domain: &str, entry: &SearchResult) -> Result<(), StoreError> {
        write_json(self.store.as_ref(), &cache_key(domain), entry)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn remove(&self, domain: &str) -> Result<(), StoreError> {
        self.store.remove(&cache_key(domain))
    }
}
