//! SlotStore: the associative container under `PolyMap`.
//!
//! Entries live in a `SlotMap`; a `HashTable` indexes them by the key hash
//! stored alongside each entry. Lookups hand out `Slot`s, generational
//! handles that stay valid until their entry is removed, so a batch read can
//! resolve every key up front and fetch the values later without hashing
//! again.

use crate::reentrancy::ProbeTracker;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_table;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Stable handle to one entry of a `SlotStore`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Slot(DefaultKey);

#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
}

pub(crate) struct SlotStore<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    probes: ProbeTracker,
}

impl<K, V, S> Clone for SlotStore<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    // Slot keys survive the clone, so the copied index stays valid.
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            index: self.index.clone(),
            slots: self.slots.clone(),
            probes: self.probes.clone(),
        }
    }
}

impl<K, V, S> SlotStore<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
            probes: ProbeTracker::new(),
        }
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        let slots = &self.slots;
        self.index.reserve(additional, |&k| {
            slots.get(k).map(|e| e.hash).unwrap_or(0)
        });
        self.slots.reserve(additional);
    }

    pub(crate) fn find<Q>(&self, q: &Q) -> Option<Slot>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.probes.enter();
        let hash = self.hasher.hash_one(q);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|e| e.key.borrow() == q)
                    .unwrap_or(false)
            })
            .map(|&k| Slot(k))
    }

    pub(crate) fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    pub(crate) fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.find(q)?;
        self.value(slot)
    }

    pub(crate) fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.find(q)?;
        self.value_mut(slot)
    }

    /// Insert `key -> value`, replacing the value of an existing equal key.
    /// The stored key is kept on replacement and the old value is returned.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.probes.enter();
        let hash = self.hasher.hash_one(&key);
        let slots = &mut self.slots;
        match self.index.entry(
            hash,
            |&k| slots.get(k).map(|e| e.key == key).unwrap_or(false),
            |&k| slots.get(k).map(|e| e.hash).unwrap_or(0),
        ) {
            hash_table::Entry::Occupied(o) => {
                let k = *o.get();
                slots
                    .get_mut(k)
                    .map(|e| core::mem::replace(&mut e.value, value))
            }
            hash_table::Entry::Vacant(v) => {
                let k = slots.insert(Entry { key, value, hash });
                let _ = v.insert(k);
                None
            }
        }
    }

    pub(crate) fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.find(q)?;
        self.remove_slot(slot)
    }

    pub(crate) fn remove_slot(&mut self, slot: Slot) -> Option<(K, V)> {
        let _g = self.probes.enter();
        let entry = self.slots.remove(slot.0)?;
        if let Ok(o) = self.index.find_entry(entry.hash, |&k| k == slot.0) {
            let _ = o.remove();
        }
        Some((entry.key, entry.value))
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
    }

    pub(crate) fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let _g = self.probes.enter();
        let index = &mut self.index;
        self.slots.retain(|k, e| {
            if keep(&e.key, &mut e.value) {
                return true;
            }
            if let Ok(o) = index.find_entry(e.hash, |&kk| kk == k) {
                let _ = o.remove();
            }
            false
        });
    }
}

impl<K, V, S> SlotStore<K, V, S> {
    #[cfg(test)]
    pub(crate) fn key(&self, slot: Slot) -> Option<&K> {
        self.slots.get(slot.0).map(|e| &e.key)
    }

    pub(crate) fn value(&self, slot: Slot) -> Option<&V> {
        self.slots.get(slot.0).map(|e| &e.value)
    }

    pub(crate) fn value_mut(&mut self, slot: Slot) -> Option<&mut V> {
        self.slots.get_mut(slot.0).map(|e| &mut e.value)
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.values(),
        }
    }

    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.values_mut(),
        }
    }

    pub(crate) fn into_entries(self) -> IntoIter<K, V> {
        IntoIter {
            it: self.slots.into_iter(),
        }
    }
}

/// Iterator over `(&K, &V)` in slot order.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Values<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in slot order.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::ValuesMut<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| (&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)`.
pub struct IntoIter<K, V> {
    it: slotmap::basic::IntoIter<DefaultKey, Entry<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::hash::Hasher;

    fn store() -> SlotStore<String, i32> {
        SlotStore::with_capacity_and_hasher(0, RandomState::new())
    }

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }

    /// Invariant: inserting an existing key replaces the value in place and
    /// returns the old one; the entry count does not change.
    #[test]
    fn insert_replaces_existing_value() {
        let mut s = store();
        assert_eq!(s.insert("k".to_string(), 1), None);
        let slot = s.find("k").unwrap();
        assert_eq!(s.insert("k".to_string(), 2), Some(1));
        assert_eq!(s.len(), 1);
        assert_eq!(s.find("k"), Some(slot), "replacement keeps the slot");
        assert_eq!(s.value(slot), Some(&2));
    }

    /// Invariant: `find(k).is_some() == contains_key(k)`, and borrowed
    /// lookups (`&str` against `String` keys) resolve.
    #[test]
    fn find_contains_parity_with_borrowed_keys() {
        let mut s = store();
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            s.insert((*k).to_string(), i as i32);
        }
        for k in ["a", "b", "c"] {
            assert!(s.find(k).is_some());
            assert!(s.contains_key(k));
        }
        for k in ["x", "y"] {
            assert!(s.find(k).is_none());
            assert!(!s.contains_key(k));
        }
        assert_eq!(s.get("b"), Some(&1));
    }

    /// Invariant: a removed entry's slot never resolves again, even after
    /// the physical slot is reused by a later insert.
    #[test]
    fn stale_slot_does_not_alias_new_entry() {
        let mut s = store();
        s.insert("old".to_string(), 1);
        let old = s.find("old").unwrap();
        assert_eq!(s.remove("old"), Some(("old".to_string(), 1)));
        s.insert("new".to_string(), 2);
        let new = s.find("new").unwrap();
        assert_ne!(old, new);
        assert!(s.value(old).is_none());
        assert!(s.key(old).is_none());
        assert_eq!(s.key(new).map(String::as_str), Some("new"));
    }

    /// Invariant: removal unlinks the index entry so the key is absent and
    /// can be inserted again with a fresh value.
    #[test]
    fn remove_then_reinsert() {
        let mut s = store();
        s.insert("k".to_string(), 1);
        assert!(s.remove("k").is_some());
        assert!(s.remove("k").is_none());
        assert!(!s.contains_key("k"));
        assert_eq!(s.insert("k".to_string(), 2), None);
        assert_eq!(s.get("k"), Some(&2));
    }

    /// Invariant: lookups stay correct when every key collides.
    #[test]
    fn collisions_resolve_by_equality() {
        let mut s: SlotStore<String, i32, ConstBuildHasher> =
            SlotStore::with_capacity_and_hasher(4, ConstBuildHasher);
        s.insert("a".to_string(), 1);
        s.insert("b".to_string(), 2);
        s.insert("a".to_string(), 10);
        assert_eq!(s.len(), 2);
        assert_eq!(s.get("a"), Some(&10));
        assert_eq!(s.get("b"), Some(&2));
        s.remove("a");
        assert_eq!(s.get("b"), Some(&2));
        assert!(s.get("a").is_none());
    }

    /// Invariant: `retain` drops rejected entries from both storage and
    /// index, and in-place edits made by the predicate persist.
    #[test]
    fn retain_keeps_index_consistent() {
        let mut s = store();
        for i in 0..10 {
            s.insert(format!("k{i}"), i);
        }
        s.retain(|_, v| {
            *v *= 10;
            *v % 20 == 0
        });
        assert_eq!(s.len(), 5);
        for i in 0..10 {
            let key = format!("k{i}");
            assert_eq!(s.contains_key(key.as_str()), i % 2 == 0);
        }
        assert_eq!(s.get("k4"), Some(&40));
        s.insert("k1".to_string(), 1);
        assert_eq!(s.len(), 6);
    }

    /// Invariant: iteration yields each live entry exactly once and
    /// `iter_mut` edits are visible to later lookups.
    #[test]
    fn iteration_and_mutation() {
        let mut s = store();
        for (i, k) in ["k1", "k2", "k3"].iter().enumerate() {
            s.insert((*k).to_string(), i as i32);
        }
        let seen: BTreeSet<String> = s.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(seen.len(), 3);
        assert_eq!(s.iter().len(), 3);
        for (_, v) in s.iter_mut() {
            *v += 10;
        }
        assert_eq!(s.get("k1"), Some(&10));
        assert_eq!(s.get("k3"), Some(&12));
    }

    /// Invariant: a clone is independent and keeps a working index.
    #[test]
    fn clone_is_independent() {
        let mut s = store();
        s.insert("a".to_string(), 1);
        let mut c = s.clone();
        c.insert("b".to_string(), 2);
        *c.get_mut("a").unwrap() = 5;
        assert_eq!(s.len(), 1);
        assert_eq!(s.get("a"), Some(&1));
        assert_eq!(c.get("a"), Some(&5));
        assert_eq!(c.get("b"), Some(&2));
    }

    /// Invariant: `clear` empties storage and index together.
    #[test]
    fn clear_and_reserve() {
        let mut s = store();
        s.reserve(16);
        s.insert("a".to_string(), 1);
        s.clear();
        assert!(s.is_empty());
        assert!(s.find("a").is_none());
        s.insert("a".to_string(), 2);
        assert_eq!(s.get("a"), Some(&2));
    }

    /// Invariant (debug-only): a key whose `Eq` reenters the store during a
    /// probe trips the reentrancy tracker.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrant_probe_panics() {
        struct ReentryKey {
            id: &'static str,
            store: *const SlotStore<ReentryKey, i32, ConstBuildHasher>,
            trigger: bool,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if self.id == other.id {
                    return true;
                }
                if other.trigger {
                    unsafe {
                        let _ = (*other.store).contains_key(self.id);
                    }
                }
                false
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }
        impl Borrow<str> for ReentryKey {
            fn borrow(&self) -> &str {
                self.id
            }
        }

        let mut s: SlotStore<ReentryKey, i32, ConstBuildHasher> =
            SlotStore::with_capacity_and_hasher(0, ConstBuildHasher);
        let ptr = &s as *const _;
        s.insert(
            ReentryKey {
                id: "a",
                store: ptr,
                trigger: false,
            },
            1,
        );
        let query = ReentryKey {
            id: "b",
            store: &s as *const _,
            trigger: true,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = s.find(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
