//! KeyView: the live key set of a `PolyMap`.
//!
//! The view borrows its map, so it can only ever observe the current keys.
//! It is rebuilt by every call to `PolyMap::keys`; nothing is cached.

use crate::poly_map::PolyMap;
use crate::slot_store::Iter;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::HashSet;

pub struct KeyView<'m, K, V, S> {
    map: &'m PolyMap<K, V, S>,
}

impl<K, V, S> Clone for KeyView<'_, K, V, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, S> Copy for KeyView<'_, K, V, S> {}

impl<'m, K, V, S> KeyView<'m, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn new(map: &'m PolyMap<K, V, S>) -> Self {
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    /// True when every key of `keys` is present; vacuously true when empty.
    pub fn contains_all<'k, I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = &'k K>,
        K: 'k,
    {
        keys.into_iter().all(|k| self.contains(k))
    }

    pub fn iter(&self) -> KeyIter<'m, K, V> {
        KeyIter {
            it: self.map.iter(),
        }
    }

    /// Snapshot of the keys as an owned set.
    pub fn to_set(&self) -> HashSet<K>
    where
        K: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Keys of `other` that are also in the map.
    pub fn intersection<I>(&self, other: I) -> HashSet<K>
    where
        I: IntoIterator<Item = K>,
    {
        other.into_iter().filter(|k| self.contains(k)).collect()
    }

    /// Keys in the map or in `other`.
    pub fn union<I>(&self, other: I) -> HashSet<K>
    where
        I: IntoIterator<Item = K>,
        K: Clone,
    {
        let mut out = self.to_set();
        out.extend(other);
        out
    }

    /// Keys of the map that are not in `other`.
    pub fn difference<I>(&self, other: I) -> HashSet<K>
    where
        I: IntoIterator<Item = K>,
        K: Clone,
    {
        let other: HashSet<K> = other.into_iter().collect();
        self.iter()
            .filter(|k| !other.contains(*k))
            .cloned()
            .collect()
    }

    /// Keys in exactly one of the map and `other`.
    pub fn symmetric_difference<I>(&self, other: I) -> HashSet<K>
    where
        I: IntoIterator<Item = K>,
        K: Clone,
    {
        let other: HashSet<K> = other.into_iter().collect();
        let mut out: HashSet<K> = self
            .iter()
            .filter(|k| !other.contains(*k))
            .cloned()
            .collect();
        out.extend(other.into_iter().filter(|k| !self.contains(k)));
        out
    }
}

impl<'m, K, V, S> IntoIterator for KeyView<'m, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = &'m K;
    type IntoIter = KeyIter<'m, K, V>;

    fn into_iter(self) -> KeyIter<'m, K, V> {
        self.iter()
    }
}

impl<K, V, S, H> PartialEq<HashSet<K, H>> for KeyView<'_, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: BuildHasher,
{
    fn eq(&self, other: &HashSet<K, H>) -> bool {
        self.len() == other.len() && other.iter().all(|k| self.contains(k))
    }
}

impl<K: fmt::Debug, V, S> fmt::Debug for KeyView<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.map.iter().map(|(k, _)| k))
            .finish()
    }
}

pub struct KeyIter<'m, K, V> {
    it: Iter<'m, K, V>,
}

impl<'m, K, V> Iterator for KeyIter<'m, K, V> {
    type Item = &'m K;

    #[inline]
    fn next(&mut self) -> Option<&'m K> {
        self.it.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for KeyIter<'_, K, V> {}

#[cfg(test)]
mod tests {
    use crate::polymap;
    use std::collections::HashSet;

    #[test]
    fn view_tracks_mutations() {
        let mut m = polymap!(a = 1, b = 2);
        assert_eq!(m.keys(), HashSet::from(["a", "b"]));
        m.insert("c", 3);
        assert_eq!(m.keys(), HashSet::from(["a", "b", "c"]));
        m.delete(["a", "b"]).unwrap();
        assert_eq!(m.keys(), HashSet::from(["c"]));
        assert_eq!(m.keys().len(), 1);
    }

    #[test]
    fn contains_all_is_subset_test() {
        let m = polymap!(a = 1, b = 2, c = 3);
        let view = m.keys();
        assert!(view.contains_all(&["a", "c"]));
        assert!(view.contains_all(&Vec::<&str>::new()));
        assert!(!view.contains_all(&["a", "z"]));
    }

    #[test]
    fn plain_set_algebra_on_keys() {
        let m = polymap!(a = 1, b = 2, c = 3);
        let k = m.keys();
        assert_eq!(k.intersection(["b", "c", "d"]), HashSet::from(["b", "c"]));
        assert_eq!(k.union(["b", "c", "d"]), HashSet::from(["a", "b", "c", "d"]));
        assert_eq!(k.difference(["b", "c", "d"]), HashSet::from(["a"]));
        assert_eq!(
            k.symmetric_difference(["b", "c", "d"]),
            HashSet::from(["a", "d"])
        );
    }

    #[test]
    fn debug_lists_keys() {
        let m = polymap!(a = 1);
        assert_eq!(format!("{:?}", m.keys()), r#"{"a"}"#);
    }
}
