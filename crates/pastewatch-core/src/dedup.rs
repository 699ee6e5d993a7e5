//! Bounded recency set of recently stored paste keys.
//!
//! Stores consult the cache before issuing a durable existence query, which
//! saves a round trip for pastes that show up in consecutive listings. The
//! cache only ever answers "seen recently": a miss is not authoritative and
//! the store must still ask its backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Capacity used by the stores when none is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 250;

/// FIFO-evicting set of keys, shared between clones.
///
/// Every operation holds a single lock for the duration of an in-memory
/// scan or push, never across I/O.
#[derive(Debug, Clone)]
pub struct DedupCache {
    entries: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl DedupCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// True if `key` was inserted and has not been evicted yet.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().iter().any(|k| k == key)
    }

    /// Record `key` as the newest entry, evicting the oldest entries past capacity.
    ///
    /// Re-inserting a resident key appends a duplicate entry; membership is
    /// all the cache answers, so duplicates only shorten the window.
    pub fn insert(&self, key: impl Into<String>) {
        let mut entries = self.lock();
        entries.push_back(key.into());
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
