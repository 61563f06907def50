//! Bounded query-embedding cache
//!
//! Repeat queries (the common case for the chat path) skip the
//! network round trip. Eviction is oldest-first once the cap is hit.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

/// Default capacity
const DEFAULT_CAPACITY: usize = 512;

/// FIFO-bounded embedding cache keyed by exact query text
pub struct EmbeddingCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

struct CacheInner {
    map: HashMap<String, Arc<Vec<f32>>>,
    order: VecDeque<String>,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    pub fn get(&self, text: &str) -> Option<Arc<Vec<f32>>> {
        self.inner.lock().map.get(text).cloned()
    }

    /// Insert and return the cached entry. A repeat insert keeps and
    /// returns the existing value.
    pub fn put(&self, text: &str, embedding: Vec<f32>) -> Arc<Vec<f32>> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.map.get(text) {
            return Arc::clone(existing);
        }
        let entry = Arc::new(embedding);
        inner.map.insert(text.to_string(), Arc::clone(&entry));
        inner.order.push_back(text.to_string());
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            }
        }
        entry
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
