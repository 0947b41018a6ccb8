//! Compute-once-per-key cache
//!
//! Each key owns a [`tokio::sync::OnceCell`]. Concurrent callers for the same
//! key wait on the one population in flight instead of issuing their own,
//! and a failed population leaves the cell empty so the next caller retries.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

/// Cache whose entries are populated at most once until cleared
#[derive(Debug)]
pub struct KeyedCache<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, running `populate` on a miss.
    ///
    /// Errors from `populate` are returned to the caller and not stored.
    pub async fn get_or_try_populate<F, Fut, E>(&self, key: &K, populate: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cells.entry(key.clone()).or_default())
        };

        cell.get_or_try_init(populate).await.cloned()
    }

    /// Drop every entry
    ///
    /// A population already in flight completes into a detached cell and is
    /// not visible afterwards.
    pub fn clear(&self) {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of populated entries
    pub fn len(&self) -> usize {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }
}

impl<K, V> Default for KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
