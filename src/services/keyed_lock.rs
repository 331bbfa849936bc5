//! Per-key async mutual exclusion.
//!
//! Serializes work on one team's workspace or one problem's voting while
//! letting different keys proceed in parallel.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Idle entries are swept once the registry grows past this size.
pub const DEFAULT_PRUNE_THRESHOLD: usize = 1024;

/// Registry of async mutexes keyed by `K`.
///
/// Entries are created on first use and swept when the registry outgrows its
/// prune threshold, so a long-lived process keeps one entry per busy key.
pub struct KeyedLock<K> {
    locks: DashMap<K, Arc<Mutex<()>>>,
    prune_threshold: usize,
}

impl<K: Eq + Hash + Clone> Default for KeyedLock<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> KeyedLock<K> {
    /// Create an empty registry with the default prune threshold.
    pub fn new() -> Self {
        Self::with_prune_threshold(DEFAULT_PRUNE_THRESHOLD)
    }

    /// Create an empty registry that sweeps idle entries past `threshold`.
    pub fn with_prune_threshold(threshold: usize) -> Self {
        Self {
            locks: DashMap::new(),
            prune_threshold: threshold.max(1),
        }
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        if self.locks.len() >= self.prune_threshold {
            self.prune();
        }
        // Clone the Arc out so the shard lock is released before awaiting
        let mutex = self.locks.entry(key.clone()).or_default().clone();
        mutex.lock_owned().await
    }

    /// Drop mutexes nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLock::<u32>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(&1).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLock::<u32>::new();
        let _a = locks.lock(&1).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(&2)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let locks = KeyedLock::<u32>::new();
        let held = locks.lock(&1).await;
        drop(locks.lock(&2).await);

        locks.prune();
        assert_eq!(locks.len(), 1);
        drop(held);
        locks.prune();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_idle_entries_are_swept_past_threshold() {
        let locks = KeyedLock::<u32>::with_prune_threshold(4);
        let held = locks.lock(&0).await;
        for key in 1..100 {
            drop(locks.lock(&key).await);
        }

        assert!(locks.len() <= 4);
        // A held key survives every sweep
        assert!(tokio::time::timeout(Duration::from_millis(20), locks.lock(&0)).await.is_err());
        drop(held);
    }
}
