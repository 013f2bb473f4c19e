//! Accumulator map split into independently locked shards.
//!
//! A key lives in shard `hash(key) % shard_count`. [`ShardedMap::access`]
//! locks only that shard and hands back a guard; the lock is released when
//! the guard drops. No method ever holds two shard locks at once.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use rustc_hash::FxHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};

pub struct ShardedMap<K, V> {
    shards: Vec<Mutex<BTreeMap<K, V>>>,
}

/// Exclusive access to one value; holds its shard's lock until dropped.
pub struct Access<'a, V> {
    guard: MappedMutexGuard<'a, V>,
}

impl<V> Deref for Access<'_, V> {
    type Target = V;
    fn deref(&self) -> &V { &self.guard }
}

impl<V> DerefMut for Access<'_, V> {
    fn deref_mut(&mut self) -> &mut V { &mut self.guard }
}

impl<K, V> ShardedMap<K, V>
where
    K: Ord + Hash,
{
    /// `shard_count` is clamped to at least one.
    pub fn new(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1)).map(|_| Mutex::new(BTreeMap::new())).collect();
        Self { shards }
    }

    pub fn shard_count(&self) -> usize { self.shards.len() }

    fn shard_for(&self, key: &K) -> &Mutex<BTreeMap<K, V>> {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }

    /// Lock the owning shard and return the value for `key`, inserting `V::default()` if absent.
    pub fn access(&self, key: K) -> Access<'_, V>
    where
        V: Default,
    {
        let guard = self.shard_for(&key).lock();
        Access { guard: MutexGuard::map(guard, |shard| shard.entry(key).or_default()) }
    }

    pub fn contains_key(&self, key: &K) -> bool { self.shard_for(key).lock().contains_key(key) }

    pub fn len(&self) -> usize { self.shards.iter().map(|s| s.lock().len()).sum() }

    pub fn is_empty(&self) -> bool { self.shards.iter().all(|s| s.lock().is_empty()) }

    /// Merge every shard into one ordered map, locking shards one at a time.
    pub fn snapshot(&self) -> BTreeMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let mut merged = BTreeMap::new();
        for shard in &self.shards {
            let shard = shard.lock();
            merged.extend(shard.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// Like [`snapshot`](Self::snapshot) but moves the entries out.
    pub fn into_map(self) -> BTreeMap<K, V> {
        let mut merged = BTreeMap::new();
        for shard in self.shards {
            merged.extend(shard.into_inner());
        }
        merged
    }
}
