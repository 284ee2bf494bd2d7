//! PolyMap: the public container and its shape-dispatching subscripts.

use crate::error::Error;
use crate::key_view::KeyView;
use crate::selector::{Classify, Fill, Selector};
use crate::slot_store::{IntoIter, Iter, IterMut, Slot, SlotStore};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::Index;
use log::{debug, trace};
use std::collections::hash_map::RandomState;
use std::collections::{HashMap, HashSet};

/// A hash map whose `get`, `set` and `delete` accept a scalar key, a
/// sequence of keys or a set of keys, and whose set operators resolve values
/// from either operand.
///
/// Not `Sync`: share it between threads behind a lock.
#[derive(Clone)]
pub struct PolyMap<K, V, S = RandomState> {
    store: SlotStore<K, V, S>,
}

/// Result of `PolyMap::get`, one variant per argument shape.
pub enum Fetched<'m, K, V, S = RandomState> {
    /// The value of a scalar key.
    Value(&'m V),
    /// The values of a key sequence, in sequence order.
    Values(Gathered<'m, K, V, S>),
    /// The entries selected by a key set.
    Map(PolyMap<K, V, S>),
}

impl<'m, K, V, S> Fetched<'m, K, V, S> {
    pub fn into_value(self) -> Option<&'m V> {
        match self {
            Fetched::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_values(self) -> Option<Gathered<'m, K, V, S>> {
        match self {
            Fetched::Values(values) => Some(values),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<PolyMap<K, V, S>> {
        match self {
            Fetched::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl<K, V, S> fmt::Debug for Fetched<'_, K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fetched::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Fetched::Values(values) => f.debug_tuple("Values").field(values).finish(),
            Fetched::Map(map) => f.debug_tuple("Map").field(map).finish(),
        }
    }
}

/// Lazy values for a key sequence whose keys were all found up front.
///
/// Each key was resolved to its slot before the iterator was handed out,
/// so iteration only dereferences slots. It runs once and cannot restart.
pub struct Gathered<'m, K, V, S> {
    store: &'m SlotStore<K, V, S>,
    slots: std::vec::IntoIter<Slot>,
}

impl<'m, K, V, S> Iterator for Gathered<'m, K, V, S> {
    type Item = &'m V;

    #[inline]
    fn next(&mut self) -> Option<&'m V> {
        let slot = self.slots.next()?;
        self.store.value(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<K, V, S> ExactSizeIterator for Gathered<'_, K, V, S> {}
impl<K, V, S> FusedIterator for Gathered<'_, K, V, S> {}

impl<K, V, S> fmt::Debug for Gathered<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gathered")
            .field("remaining", &self.slots.len())
            .finish()
    }
}

impl<K, V> PolyMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V, S> PolyMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            store: SlotStore::with_capacity_and_hasher(capacity, hasher),
        }
    }

    pub fn hasher(&self) -> &S {
        self.store.hasher()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.store.reserve(additional)
    }

    /// Live view of the current key set.
    pub fn keys(&self) -> KeyView<'_, K, V, S> {
        KeyView::new(self)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.contains_key(key)
    }

    /// Plain single-key read, `None` when absent.
    pub fn lookup<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.get(key)
    }

    pub fn lookup_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.get_mut(key)
    }

    /// Insert or overwrite one entry, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.store.insert(key, value)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.remove(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.remove(key)
    }

    pub fn clear(&mut self) {
        self.store.clear()
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.store.retain(keep)
    }

    /// Shape-dispatching read.
    ///
    /// - a scalar yields its value;
    /// - a sequence yields its values lazily, in order, once every key was
    ///   found;
    /// - a set yields a new map of exactly those entries.
    ///
    /// A missing key fails the whole call with `KeyNotFound` before any
    /// value is produced; an unclassifiable argument fails with `InvalidKey`.
    ///
    /// ```
    /// use poly_map::{polymap, Fetched};
    /// use std::collections::HashSet;
    ///
    /// let m = polymap!(a = 1, b = 2, c = 3);
    /// assert!(matches!(m.get("b"), Ok(Fetched::Value(&2))));
    ///
    /// let values: Vec<_> = m.get(["a", "c"]).unwrap().into_values().unwrap().collect();
    /// assert_eq!(values, [&1, &3]);
    ///
    /// let sub = m.get(HashSet::from(["a", "c"])).unwrap().into_map().unwrap();
    /// assert_eq!(sub, polymap!(a = 1, c = 3));
    /// ```
    pub fn get<Sel>(&self, key: Sel) -> Result<Fetched<'_, K, V, S>, Error<K>>
    where
        Sel: Classify<K>,
        V: Clone,
        S: Clone,
    {
        match key.classify() {
            Selector::Scalar(k) => match self.store.get(&k) {
                Some(v) => Ok(Fetched::Value(v)),
                None => Err(Error::KeyNotFound(Selector::Scalar(k))),
            },
            Selector::Sequence(keys) => self.gather(keys).map(Fetched::Values),
            Selector::Set(keys) => self.subset(keys).map(Fetched::Map),
            Selector::Invalid => Err(Error::InvalidKey),
        }
    }

    fn gather(&self, keys: Vec<K>) -> Result<Gathered<'_, K, V, S>, Error<K>> {
        let slots: Option<Vec<Slot>> = keys.iter().map(|k| self.store.find(k)).collect();
        match slots {
            Some(slots) => {
                trace!("gathered {} values", slots.len());
                Ok(Gathered {
                    store: &self.store,
                    slots: slots.into_iter(),
                })
            }
            None => {
                debug!("sequence read rejected: {} keys requested", keys.len());
                Err(Error::KeyNotFound(Selector::Sequence(keys)))
            }
        }
    }

    fn subset(&self, keys: HashSet<K>) -> Result<Self, Error<K>>
    where
        V: Clone,
        S: Clone,
    {
        if !self.keys().contains_all(&keys) {
            debug!("set read rejected: {} keys requested", keys.len());
            return Err(Error::KeyNotFound(Selector::Set(keys)));
        }
        let mut out = Self::with_capacity_and_hasher(keys.len(), self.hasher().clone());
        for k in keys {
            if let Some(v) = self.store.get(&k) {
                let v = v.clone();
                out.store.insert(k, v);
            }
        }
        Ok(out)
    }

    /// Shape-dispatching write.
    ///
    /// A scalar key takes `Fill::One`. A key sequence paired with
    /// `Fill::Each` assigns by position and stops at the shorter side. A
    /// sequence or set of keys paired with `Fill::One` gives every key a
    /// clone of the value. Every other pairing is `InvalidKey` and leaves
    /// the map untouched.
    ///
    /// ```
    /// use poly_map::{polymap, Fill};
    /// use std::collections::HashSet;
    ///
    /// let mut m = polymap!(a = 1, b = 2, c = 3);
    /// m.set(["a", "c"], Fill::each([11, 33])).unwrap();
    /// assert_eq!(m, polymap!(a = 11, b = 2, c = 33));
    ///
    /// m.set(HashSet::from(["a", "c"]), 0).unwrap();
    /// assert_eq!(m, polymap!(a = 0, b = 2, c = 0));
    /// ```
    pub fn set<Sel, F>(&mut self, key: Sel, fill: F) -> Result<(), Error<K>>
    where
        Sel: Classify<K>,
        F: Into<Fill<V>>,
        V: Clone,
    {
        match (key.classify(), fill.into()) {
            (Selector::Scalar(k), Fill::One(v)) => {
                self.store.insert(k, v);
            }
            (Selector::Sequence(keys), Fill::Each(values)) => {
                trace!(
                    "positional assignment of {} keys",
                    keys.len().min(values.len())
                );
                self.extend(keys.into_iter().zip(values));
            }
            (Selector::Sequence(keys), Fill::One(v)) => self.fill_uniform(keys, v),
            (Selector::Set(keys), Fill::One(v)) => self.fill_uniform(keys, v),
            (Selector::Scalar(_), Fill::Each(_))
            | (Selector::Set(_), Fill::Each(_))
            | (Selector::Invalid, _) => return Err(Error::InvalidKey),
        }
        Ok(())
    }

    fn fill_uniform<I>(&mut self, keys: I, value: V)
    where
        I: IntoIterator<Item = K>,
        V: Clone,
    {
        let keys = keys.into_iter();
        trace!("uniform assignment of {} keys", keys.size_hint().0);
        self.extend(keys.map(|k| (k, value.clone())));
    }

    /// Shape-dispatching delete.
    ///
    /// A scalar removes one entry. A sequence or set removes its distinct
    /// keys, but only after all of them were found; otherwise it fails with
    /// `KeyNotFound` and nothing is removed.
    ///
    /// ```
    /// use poly_map::polymap;
    ///
    /// let mut m = polymap!(a = 1, b = 2, c = 3);
    /// assert!(m.delete(["a", "z"]).is_err());
    /// assert_eq!(m.len(), 3);
    /// m.delete(["a", "c"]).unwrap();
    /// assert_eq!(m, polymap!(b = 2));
    /// ```
    pub fn delete<Sel>(&mut self, key: Sel) -> Result<(), Error<K>>
    where
        Sel: Classify<K>,
    {
        match key.classify() {
            Selector::Scalar(k) => match self.store.remove(&k) {
                Some(_) => Ok(()),
                None => Err(Error::KeyNotFound(Selector::Scalar(k))),
            },
            Selector::Sequence(keys) => {
                if !self.keys().contains_all(&keys) {
                    debug!("sequence delete rejected: {} keys requested", keys.len());
                    return Err(Error::KeyNotFound(Selector::Sequence(keys)));
                }
                self.remove_all(keys);
                Ok(())
            }
            Selector::Set(keys) => {
                if !self.keys().contains_all(&keys) {
                    debug!("set delete rejected: {} keys requested", keys.len());
                    return Err(Error::KeyNotFound(Selector::Set(keys)));
                }
                self.remove_all(keys);
                Ok(())
            }
            Selector::Invalid => Err(Error::InvalidKey),
        }
    }

    // Repeated keys find nothing on their second pass, so this removes the
    // distinct keys of `keys`.
    fn remove_all<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
    {
        let mut removed = 0usize;
        for k in keys {
            if self.store.remove(&k).is_some() {
                removed += 1;
            }
        }
        trace!("bulk delete removed {} keys", removed);
    }
}

impl<K, V, S> PolyMap<K, V, S> {
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.store.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.store.iter_mut()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.store.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.store.iter_mut().map(|(_, v)| v)
    }
}

impl<K, V, S> Default for PolyMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> PartialEq for PolyMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.lookup(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S> Eq for PolyMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for PolyMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PolyMap(")?;
        f.debug_map().entries(self.iter()).finish()?;
        f.write_str(")")
    }
}

impl<K, Q, V, S> Index<&Q> for PolyMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// Panics when `key` is absent, like `HashMap`.
    fn index(&self, key: &Q) -> &V {
        self.lookup(key).expect("no entry found for key")
    }
}

impl<K, V, S> Extend<(K, V)> for PolyMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.store.insert(k, v);
        }
    }
}

impl<'a, K, V, S> Extend<(&'a K, &'a V)> for PolyMap<K, V, S>
where
    K: Eq + Hash + Copy,
    V: Copy,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(&k, &v)| (k, v)));
    }
}

impl<K, V, S> FromIterator<(K, V)> for PolyMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for PolyMap<K, V>
where
    K: Eq + Hash,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K, V, S, H> From<HashMap<K, V, H>> for PolyMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from(map: HashMap<K, V, H>) -> Self {
        map.into_iter().collect()
    }
}

impl<K, V, S> From<PolyMap<K, V, S>> for HashMap<K, V>
where
    K: Eq + Hash,
{
    fn from(map: PolyMap<K, V, S>) -> Self {
        map.into_iter().collect()
    }
}

impl<K, V, S> IntoIterator for PolyMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        self.store.into_entries()
    }
}

impl<'a, K, V, S> IntoIterator for &'a PolyMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut PolyMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
