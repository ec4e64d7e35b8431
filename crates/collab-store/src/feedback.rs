use std::sync::Arc;

use collab_core::FeedbackEntry;

use crate::{read_json, write_json, KeyValueStore, StoreError};

const FEEDBACK_KEY: &str = "bcf_feedback_corpus";

/// Maximum number of retained feedback entries.
pub const FEEDBACK_CAPACITY: usize = 100;

/// Append-only feedback corpus; the oldest entries fall off past capacity.
#[derive(Clone)]
pub struct FeedbackLog {
    store: Arc<dyn KeyValueStore>,
}

impl FeedbackLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Entries oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn entries(&self) -> Result<Vec<FeedbackEntry>, StoreError> {
        read_json(self.store.as_ref(), FEEDBACK_KEY)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn record(&self, entry: FeedbackEntry) -> Result<usize, StoreError> {
        let mut entries = self.entries()?;
        entries.push(entry);
        if entries.len() > FEEDBACK_CAPACITY {
            let excess = entries.len() - FEEDBACK_CAPACITY;
            entries.drain(..excess);
        }
        write_json(self.store.as_ref(), FEEDBACK_KEY, &entries)?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use collab_core::{FeedbackResult, Rating};

    use super::*;
    use crate::MemoryStore;

    fn entry(id: usize) -> FeedbackEntry {
        FeedbackEntry {
            search_id: format!("s{id}"),
            input_url: "acme.com".to_string(),
            results: vec![FeedbackResult {
                name: "Fishwife".to_string(),
                url: "https://eatfishwife.com".to_string(),
            }],
            rating: Rating::Positive,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn hundred_and_first_entry_evicts_oldest() {
        let log = FeedbackLog::new(Arc::new(MemoryStore::new()));
        for i in 0..=FEEDBACK_CAPACITY {
            log.record(entry(i)).unwrap();
        }
        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), FEEDBACK_CAPACITY);
        assert_eq!(entries[0].search_id, "s1");
        assert_eq!(entries[FEEDBACK_CAPACITY - 1].search_id, "s100");
    }

    #[test]
    fn entries_serialize_with_camel_case_keys() {
        let store = Arc::new(MemoryStore::new());
        let log = FeedbackLog::new(store.clone());
        log.record(entry(7)).unwrap();
        let raw = store.get(FEEDBACK_KEY).unwrap().unwrap();
        assert!(raw.contains("\"searchId\":\"s7\""));
        assert!(raw.contains("\"rating\":\"positive\""));
    }
}
