//! Typed keyed memoization for one evaluation context.
//!
//! Repeated evaluations of the same pipeline (interactive tuning, sweep
//! trials) recompute the same derived series over and over. `MemoCache`
//! memoizes them under a typed [`CacheKey`] — a name plus its stable parameter
//! fields — so a key can never collide with another computation the way ad hoc
//! concatenated strings can.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Typed cache key: computation name + stable parameter tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: String,
    params: Vec<String>,
}

impl CacheKey {
    pub fn new(name: impl Into<String>, params: impl IntoIterator<Item = String>) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().collect(),
        }
    }
}

/// In-memory memoization cache plus a small `f64` buffer pool.
///
/// Scoped to one evaluation context; sharing across threads is safe but the
/// cache makes no cross-process guarantees.
#[derive(Default)]
pub struct MemoCache {
    entries: Mutex<HashMap<CacheKey, Arc<dyn Any + Send + Sync>>>,
    pool: Mutex<Vec<Vec<f64>>>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    ///
    /// The producer runs without holding the cache lock, so it may itself call
    /// back into the cache. Two racing producers for the same key both
    /// compute; the results are assumed equivalent (deterministic producers)
    /// and either may win.
    pub fn get_or_compute<T, F>(&self, key: &CacheKey, producer: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        if let Some(hit) = self.get::<T>(key) {
            return hit;
        }
        let value = Arc::new(producer());
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.clone(), value.clone() as Arc<dyn Any + Send + Sync>);
        value
    }

    /// Returns the cached value for `key` if present with type `T`.
    ///
    /// For callers whose producer is fallible: check here first, then insert
    /// the computed value through [`MemoCache::get_or_compute`] on success.
    pub fn get<T: Send + Sync + 'static>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let entries = self.entries.lock().unwrap();
        entries.get(key).and_then(|v| Arc::clone(v).downcast::<T>().ok())
    }

    /// Pool-or-allocate a buffer of length `len`.
    ///
    /// A pooled buffer may carry values from a previous use inside the first
    /// `len` slots; callers must not assume zero-initialization beyond what
    /// they explicitly write.
    pub fn get_array(&self, len: usize) -> Vec<f64> {
        let mut pool = self.pool.lock().unwrap();
        match pool.pop() {
            Some(mut buf) => {
                buf.resize(len, 0.0);
                buf
            }
            None => vec![0.0; len],
        }
    }

    /// Returns a buffer to the pool for reuse.
    pub fn recycle(&self, buf: Vec<f64>) {
        self.pool.lock().unwrap().push(buf);
    }
}
