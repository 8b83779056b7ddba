//! Concurrency primitives every shared table is built on.
//!
//! [`Registry`] is an ordered map behind a reader/writer lock: any number of
//! readers run together, a writer excludes everyone else, and snapshots are
//! owned copies that later writes never touch. [`AtomicCounter`] hands out
//! unique, strictly increasing ids.
//!
//! Locks here are `parking_lot` locks and are never held across an `.await`.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Monotonic id generator.
///
/// Every call to [`next`](Self::next) returns a value no other call has
/// returned. Single-threaded use yields `1, 2, 3, ...` with no gaps.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl AtomicCounter {
    /// Creates a counter whose first [`next`](Self::next) returns 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Returns the next unused value.
    pub fn next(&self) -> u64 {
        // A single fetch_add is indivisible, so two callers can never read
        // the same previous value.
        self.value.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the most recently issued value, or 0 if none.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Thread-safe ordered map guarded by a reader/writer lock.
///
/// Snapshots are returned in key order.
#[derive(Debug)]
pub struct Registry<K, V> {
    entries: RwLock<BTreeMap<K, V>>,
}

impl<K, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<K: Ord, V> Registry<K, V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry, returning the previous value.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.entries.write().insert(key, value)
    }

    /// Inserts only if the key is absent. Returns `true` if inserted.
    ///
    /// The existence test and the insert happen under one write lock, so of
    /// several callers racing on the same key exactly one succeeds.
    pub fn put_if_absent(&self, key: K, value: V) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, value);
        true
    }

    /// Removes an entry, returning its value if it was present.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.write().remove(key)
    }

    /// Returns `true` if the key is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.read().contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Runs `f` with shared access to the whole map.
    ///
    /// Writers are held off until `f` returns, so everything `f` observes is
    /// one consistent state. `f` must not block and must not call back into
    /// this registry.
    pub fn read<R>(&self, f: impl FnOnce(&BTreeMap<K, V>) -> R) -> R {
        f(&self.entries.read())
    }

    /// Runs `f` with exclusive access to the whole map.
    ///
    /// This is the escape hatch for compound operations that must be atomic
    /// with respect to every other reader and writer. `f` must not block and
    /// must not call back into this registry.
    pub fn write<R>(&self, f: impl FnOnce(&mut BTreeMap<K, V>) -> R) -> R {
        f(&mut self.entries.write())
    }
}

impl<K: Ord + Clone, V: Clone> Registry<K, V> {
    /// Returns a copy of the value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.read().get(key).cloned()
    }

    /// Returns a point-in-time copy of all keys, in key order.
    #[must_use]
    pub fn keys_snapshot(&self) -> Vec<K> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns a point-in-time copy of all values, in key order.
    #[must_use]
    pub fn values_snapshot(&self) -> Vec<V> {
        self.entries.read().values().cloned().collect()
    }
}
