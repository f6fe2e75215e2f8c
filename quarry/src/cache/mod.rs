//! Keyed memoization of async computations.
//!
//! [`AsyncCache`] starts at most one computation per key. Requests that arrive
//! while the computation is in flight share the same eventual result. Entries
//! never expire; callers evict with [`AsyncCache::delete`] (usually from a
//! file-change event) or drop the whole cache.
//!
//! Failures are cached like successes. A caller that wants to retry must
//! delete the key first.

use crate::error::{QuarryError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

type SharedResult<V> = std::result::Result<V, Arc<QuarryError>>;
type Entry<V> = Shared<BoxFuture<'static, SharedResult<V>>>;

pub struct AsyncCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V> AsyncCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        AsyncCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the value stored under `key`, starting `compute` only when no
    /// entry (resolved or pending) exists.
    ///
    /// `compute` is called while the map is locked, so it should only build
    /// the future; the actual work happens when the returned future is polled.
    pub fn cached<F, Fut>(
        &self,
        key: impl Into<String>,
        compute: F,
    ) -> impl Future<Output = Result<V>> + Send + 'static
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let key = key.into();
        let entry = {
            let mut entries = self.entries.lock();
            match entries.get(&key) {
                Some(entry) => {
                    log::trace!("cache hit: {key}");
                    entry.clone()
                }
                None => {
                    log::trace!("cache miss: {key}");
                    let future = compute();
                    let entry = async move { future.await.map_err(Arc::new) }
                        .boxed()
                        .shared();
                    entries.insert(key, entry.clone());
                    entry
                }
            }
        };

        async move { entry.await.map_err(QuarryError::Shared) }
    }

    /// The value under `key` if its computation has already finished.
    pub fn peek(&self, key: &str) -> Option<Result<V>> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .and_then(|entry| entry.peek().cloned())
            .map(|result| result.map_err(QuarryError::Shared))
    }

    /// Evict one key. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Evict every key for which `predicate` returns true. Returns the number
    /// of evicted entries.
    pub fn delete_where(&self, mut predicate: impl FnMut(&str) -> bool) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for AsyncCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
