//! Session-scoped persistence: the per-domain result cache, the bounded
//! search history, and the feedback log.
//!
//! Everything is stored as JSON text under fixed keys in a [`KeyValueStore`].
//! Absent or unreadable values read as empty.

pub mod cache;
pub mod feedback;
pub mod history;
pub mod kv;

use std::sync::Arc;

use thiserror::Error;

pub use cache::SessionCache;
pub use feedback::{FeedbackLog, FEEDBACK_CAPACITY};
pub use history::{SearchHistory, HISTORY_CAPACITY};
pub use kv::{FileStore, KeyValueStore, MemoryStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not serialize value for {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store lock poisoned")]
    Poisoned,
}

/// The three session stores sharing one backend.
#[derive(Clone)]
pub struct Stores {
    pub cache: SessionCache,
    pub history: SearchHistory,
    pub feedback: FeedbackLog,
}

impl Stores {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            cache: SessionCache::new(Arc::clone(&backend)),
            history: SearchHistory::new(Arc::clone(&backend)),
            feedback: FeedbackLog::new(backend),
        }
    }

    /// Stores backed by JSON files under `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(dir: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(FileStore::open(dir)?)))
    }

    /// Stores that live only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

/// Read `key` as `T`, treating absent or corrupt values as `T::default()`.
///
/// # Errors
///
/// Returns [`StoreError`] only when the backing store itself fails.
pub fn read_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<T, StoreError>
where
    T: serde::de::DeserializeOwned + Default,
{
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "stored value unreadable, treating as empty");
            Ok(T::default())
        }
    }
}

/// Serialize `value` and store it under `key`.
///
/// # Errors
///
/// Returns [`StoreError::Serialize`] or a backing-store failure.
pub fn write_json<T: serde::Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|e| StoreError::Serialize {
        key: key.to_string(),
        source: e,
    })?;
    store.set(key, &raw)
}
