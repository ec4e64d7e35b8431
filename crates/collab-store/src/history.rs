use std::sync::Arc;

use chrono::Utc;
use collab_core::HistoryEntry;

use crate::{read_json, write_json, KeyValueStore, StoreError};

const HISTORY_KEY: &str = "bcf_search_history";

/// Maximum number of remembered searches.
pub const HISTORY_CAPACITY: usize = 10;

/// Most-recent-first list of searched domains, unique by domain.
#[derive(Clone)]
pub struct SearchHistory {
    store: Arc<dyn KeyValueStore>,
}

impl SearchHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn list(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        read_json(self.store.as_ref(), HISTORY_KEY)
    }

    /// Move `domain` to the front, dropping the oldest entries past capacity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn add(&self, domain: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut entries = self.list()?;
        entries.retain(|e| e.domain != domain);
        entries.insert(
            0,
            HistoryEntry {
                domain: domain.to_string(),
                url: domain.to_string(),
                timestamp: Utc::now(),
            },
        );
        entries.truncate(HISTORY_CAPACITY);
        write_json(self.store.as_ref(), HISTORY_KEY, &entries)?;
        Ok(entries)
    }

    /// Remove `domain`; absent domains leave the list untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn remove(&self, domain: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut entries = self.list()?;
        let before = entries.len();
        entries.retain(|e| e.domain != domain);
        if entries.len() != before {
            write_json(self.store.as_ref(), HISTORY_KEY, &entries)?;
        }
        Ok(entries)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(HISTORY_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn history() -> SearchHistory {
        SearchHistory::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn empty_when_nothing_stored() {
        assert!(history().list().unwrap().is_empty());
    }

    #[test]
    fn repeat_search_moves_to_front_without_duplicate() {
        let h = history();
        h.add("a.com").unwrap();
        h.add("b.com").unwrap();
        let entries = h.add("a.com").unwrap();
        let domains: Vec<_> = entries.iter().map(|e| e.domain.as_str()).collect();
        assert_eq!(domains, vec!["a.com", "b.com"]);
        assert_eq!(entries[0].url, "a.com");
    }

    #[test]
    fn never_exceeds_capacity() {
        let h = history();
        for i in 0..15 {
            h.add(&format!("brand{i}.com")).unwrap();
        }
        let entries = h.list().unwrap();
        assert_eq!(entries.len(), HISTORY_CAPACITY);
        assert_eq!(entries[0].domain, "brand14.com");
        assert_eq!(entries[9].domain, "brand5.com");
    }

    #[test]
    fn removing_absent_domain_is_noop() {
        let h = history();
        h.add("a.com").unwrap();
        let entries = h.remove("zzz.com").unwrap();
        assert_eq!(entries.len(), 1);
        let entries = h.remove("a.com").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn corrupt_value_reads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(HISTORY_KEY, "not json").unwrap();
        let h = SearchHistory::new(store);
        assert!(h.list().unwrap().is_empty());
        h.add("a.com").unwrap();
        assert_eq!(h.list().unwrap().len(), 1);
    }

    #[test]
    fn clear_empties_list() {
        let h = history();
        h.add("a.com").unwrap();
        h.clear().unwrap();
        assert!(h.list().unwrap().is_empty());
    }
}
