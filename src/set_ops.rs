//! Set algebra between a `PolyMap` and a map or plain key set.
//!
//! The key set of a result is the ordinary set operation on the two key
//! sets. Values come from the left map whenever it has the key. Keys that
//! only the right operand contributes take the right map's value, or a fill
//! value when the right operand is a plain key set. `union` and
//! `symmetric_difference` fill with `V::default()` (`None` for `Option`
//! values); the `_or` variants take an explicit fill.
//!
//! A plain set on the *left* of `&`, `|` or `^` has no values to offer, so
//! those forms yield a plain `HashSet` of keys.

use crate::poly_map::PolyMap;
use core::hash::{BuildHasher, Hash};
use core::ops::{BitAnd, BitOr, BitXor, Sub};
use log::trace;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeSet, HashSet};

/// Right-hand operand of the set operations.
pub enum Operand<'o, K, V, S = RandomState> {
    /// Another map; it supplies values for keys it alone contributes.
    Map(&'o PolyMap<K, V, S>),
    /// Bare keys without values.
    Keys(HashSet<K>),
}

impl<K, V, S> Operand<'_, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn contains(&self, key: &K) -> bool {
        match self {
            Operand::Map(m) => m.contains_key(key),
            Operand::Keys(keys) => keys.contains(key),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Operand::Map(m) => m.len(),
            Operand::Keys(keys) => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'o, K, V, S> From<&'o PolyMap<K, V, S>> for Operand<'o, K, V, S> {
    fn from(map: &'o PolyMap<K, V, S>) -> Self {
        Operand::Map(map)
    }
}

impl<K, V, S> From<HashSet<K>> for Operand<'_, K, V, S> {
    fn from(keys: HashSet<K>) -> Self {
        Operand::Keys(keys)
    }
}

impl<K, V, S, H> From<&HashSet<K, H>> for Operand<'_, K, V, S>
where
    K: Eq + Hash + Clone,
{
    fn from(keys: &HashSet<K, H>) -> Self {
        Operand::Keys(keys.iter().cloned().collect())
    }
}

impl<K: Eq + Hash, V, S> From<BTreeSet<K>> for Operand<'_, K, V, S> {
    fn from(keys: BTreeSet<K>) -> Self {
        Operand::Keys(keys.into_iter().collect())
    }
}

impl<K: Eq + Hash, V, S> From<Vec<K>> for Operand<'_, K, V, S> {
    fn from(keys: Vec<K>) -> Self {
        Operand::Keys(keys.into_iter().collect())
    }
}

impl<K: Eq + Hash, V, S, const N: usize> From<[K; N]> for Operand<'_, K, V, S> {
    fn from(keys: [K; N]) -> Self {
        Operand::Keys(keys.into_iter().collect())
    }
}

impl<K: Eq + Hash + Clone, V, S> From<&[K]> for Operand<'_, K, V, S> {
    fn from(keys: &[K]) -> Self {
        Operand::Keys(keys.iter().cloned().collect())
    }
}

impl<K, V, S> PolyMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Entries whose key is not in `other`.
    ///
    /// ```
    /// use poly_map::polymap;
    ///
    /// let m = polymap!(a = 1, b = 2, c = 3);
    /// assert_eq!(m.difference(["b", "c", "d"]), polymap!(a = 1));
    /// ```
    pub fn difference<'o>(&self, other: impl Into<Operand<'o, K, V, S>>) -> Self
    where
        K: 'o,
        V: 'o,
        S: 'o,
    {
        let other = other.into();
        self.filtered(|k| !other.contains(k))
    }

    /// Entries whose key is also in `other`, with this map's values.
    pub fn intersect<'o>(&self, other: impl Into<Operand<'o, K, V, S>>) -> Self
    where
        K: 'o,
        V: 'o,
        S: 'o,
    {
        let other = other.into();
        self.filtered(|k| other.contains(k))
    }

    /// Entries whose key is in either operand.
    ///
    /// ```
    /// use poly_map::polymap;
    ///
    /// let m = polymap!(a = 1, b = 2, c = 3);
    /// let other = polymap!(b = 22, c = 33, d = 44);
    /// assert_eq!(m.union(&other), polymap!(a = 1, b = 2, c = 3, d = 44));
    ///
    /// let m = polymap!(a = Some(1));
    /// assert_eq!(m.union(["b"]), polymap!(a = Some(1), b = None));
    /// ```
    pub fn union<'o>(&self, other: impl Into<Operand<'o, K, V, S>>) -> Self
    where
        K: 'o,
        V: Default + 'o,
        S: 'o,
    {
        self.merged(other.into(), true, V::default)
    }

    /// Like `union`, filling keys contributed only by a plain key set with
    /// `fill`.
    pub fn union_or<'o>(&self, other: impl Into<Operand<'o, K, V, S>>, fill: V) -> Self
    where
        K: 'o,
        V: 'o,
        S: 'o,
    {
        self.merged(other.into(), true, || fill.clone())
    }

    /// Entries whose key is in exactly one operand.
    pub fn symmetric_difference<'o>(&self, other: impl Into<Operand<'o, K, V, S>>) -> Self
    where
        K: 'o,
        V: Default + 'o,
        S: 'o,
    {
        self.merged(other.into(), false, V::default)
    }

    /// Like `symmetric_difference`, filling keys contributed only by a
    /// plain key set with `fill`.
    pub fn symmetric_difference_or<'o>(
        &self,
        other: impl Into<Operand<'o, K, V, S>>,
        fill: V,
    ) -> Self
    where
        K: 'o,
        V: 'o,
        S: 'o,
    {
        self.merged(other.into(), false, || fill.clone())
    }

    fn filtered<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&K) -> bool,
    {
        let entries = self
            .iter()
            .filter(|(k, _)| keep(k))
            .map(|(k, v)| (k.clone(), v.clone()));
        let mut out = Self::with_hasher(self.hasher().clone());
        out.extend(entries);
        out
    }

    // `keep_shared` separates union (shared keys kept) from symmetric
    // difference (shared keys dropped). Keys only `other` holds are resolved
    // once per operand kind.
    fn merged<F>(&self, other: Operand<'_, K, V, S>, keep_shared: bool, mut fill: F) -> Self
    where
        F: FnMut() -> V,
    {
        let mut out = Self::with_capacity_and_hasher(
            self.len() + other.len(),
            self.hasher().clone(),
        );
        for (k, v) in self.iter() {
            if keep_shared || !other.contains(k) {
                out.insert(k.clone(), v.clone());
            }
        }
        let before = out.len();
        match other {
            Operand::Map(m) => {
                for (k, v) in m.iter() {
                    if !self.contains_key(k) {
                        out.insert(k.clone(), v.clone());
                    }
                }
            }
            Operand::Keys(keys) => {
                for k in keys {
                    if !self.contains_key(&k) {
                        out.insert(k, fill());
                    }
                }
            }
        }
        trace!("merge took {} keys from the right operand", out.len() - before);
        out
    }
}

macro_rules! map_operators {
    ($($op:ident :: $method:ident => $call:ident, [$($extra:tt)*];)*) => {
        $(
            impl<'a, 'b, K, V, S> $op<&'b PolyMap<K, V, S>> for &'a PolyMap<K, V, S>
            where
                K: Eq + Hash + Clone,
                V: Clone $($extra)*,
                S: BuildHasher + Clone,
            {
                type Output = PolyMap<K, V, S>;

                fn $method(self, rhs: &'b PolyMap<K, V, S>) -> PolyMap<K, V, S> {
                    self.$call(rhs)
                }
            }

            impl<'a, 'b, K, V, S, H> $op<&'b HashSet<K, H>> for &'a PolyMap<K, V, S>
            where
                K: Eq + Hash + Clone,
                V: Clone $($extra)*,
                S: BuildHasher + Clone,
            {
                type Output = PolyMap<K, V, S>;

                fn $method(self, rhs: &'b HashSet<K, H>) -> PolyMap<K, V, S> {
                    self.$call(rhs)
                }
            }
        )*
    };
}

map_operators! {
    Sub::sub => difference, [];
    BitAnd::bitand => intersect, [];
    BitOr::bitor => union, [+ Default];
    BitXor::bitxor => symmetric_difference, [+ Default];
}

impl<K, V, S, H> BitAnd<&PolyMap<K, V, S>> for &HashSet<K, H>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
    H: BuildHasher + Default,
{
    type Output = HashSet<K, H>;

    fn bitand(self, rhs: &PolyMap<K, V, S>) -> HashSet<K, H> {
        self.iter().filter(|k| rhs.contains_key(*k)).cloned().collect()
    }
}

impl<K, V, S, H> BitOr<&PolyMap<K, V, S>> for &HashSet<K, H>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
    H: BuildHasher + Default,
{
    type Output = HashSet<K, H>;

    fn bitor(self, rhs: &PolyMap<K, V, S>) -> HashSet<K, H> {
        self.iter().chain(rhs.keys()).cloned().collect()
    }
}

impl<K, V, S, H> BitXor<&PolyMap<K, V, S>> for &HashSet<K, H>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
    H: BuildHasher + Default,
{
    type Output = HashSet<K, H>;

    fn bitxor(self, rhs: &PolyMap<K, V, S>) -> HashSet<K, H> {
        let left = self.iter().filter(|k| !rhs.contains_key(*k));
        let right = rhs.keys().into_iter().filter(|k| !self.contains(*k));
        left.chain(right).cloned().collect()
    }
}
