//! Argument shapes for the dispatching subscripts.
//!
//! Every argument to `PolyMap::get`, `set` and `delete` is classified into
//! exactly one `Selector` before anything else happens. Classification
//! follows a fixed order: a value that is usable as a key is a scalar; an
//! ordered, indexable collection is a sequence; any other collection is
//! treated as an unordered set. Whatever fits none of these is `Invalid`.

use core::hash::{BuildHasher, Hash};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// A subscript argument after classification.
#[derive(Clone, Debug)]
pub enum Selector<K> {
    /// A single key.
    Scalar(K),
    /// Keys in positional order; duplicates are kept.
    Sequence(Vec<K>),
    /// Distinct keys with no order.
    Set(HashSet<K>),
    /// An argument that could not be classified.
    Invalid,
}

impl<K> Selector<K> {
    /// Number of keys addressed; zero for `Invalid`.
    pub fn len(&self) -> usize {
        match self {
            Selector::Scalar(_) => 1,
            Selector::Sequence(keys) => keys.len(),
            Selector::Set(keys) => keys.len(),
            Selector::Invalid => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash> PartialEq for Selector<K> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Selector::Scalar(a), Selector::Scalar(b)) => a == b,
            (Selector::Sequence(a), Selector::Sequence(b)) => a == b,
            (Selector::Set(a), Selector::Set(b)) => a == b,
            (Selector::Invalid, Selector::Invalid) => true,
            _ => false,
        }
    }
}

impl<K: Eq + Hash> Eq for Selector<K> {}

/// A generic iterable has no usable order, so it becomes a set.
impl<K: Eq + Hash> FromIterator<K> for Selector<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Selector::Set(iter.into_iter().collect())
    }
}

/// Conversion of a subscript argument into its `Selector`.
///
/// Implemented for the common scalar key types, for ordered collections
/// (`Vec`, arrays, slices, `VecDeque`) and for sets (`HashSet`, `BTreeSet`,
/// `hashbrown::HashSet`). A key type of your own can be passed as
/// `Selector::Scalar(key)`, or can implement this trait; a dynamic value type
/// returns `Selector::Invalid` for variants that are not usable as keys.
pub trait Classify<K> {
    fn classify(self) -> Selector<K>;
}

impl<K> Classify<K> for Selector<K> {
    #[inline]
    fn classify(self) -> Selector<K> {
        self
    }
}

macro_rules! scalar_keys {
    ($($t:ty),* $(,)?) => {
        $(
            impl Classify<$t> for $t {
                #[inline]
                fn classify(self) -> Selector<$t> {
                    Selector::Scalar(self)
                }
            }

            impl Classify<$t> for &$t {
                #[inline]
                fn classify(self) -> Selector<$t> {
                    Selector::Scalar(*self)
                }
            }
        )*
    };
}

scalar_keys!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
);

impl<'a> Classify<&'a str> for &'a str {
    #[inline]
    fn classify(self) -> Selector<&'a str> {
        Selector::Scalar(self)
    }
}

impl Classify<String> for String {
    #[inline]
    fn classify(self) -> Selector<String> {
        Selector::Scalar(self)
    }
}

impl Classify<String> for &str {
    #[inline]
    fn classify(self) -> Selector<String> {
        Selector::Scalar(self.to_owned())
    }
}

impl Classify<String> for &String {
    #[inline]
    fn classify(self) -> Selector<String> {
        Selector::Scalar(self.clone())
    }
}

impl<K> Classify<K> for Vec<K> {
    fn classify(self) -> Selector<K> {
        Selector::Sequence(self)
    }
}

impl<K: Clone> Classify<K> for &Vec<K> {
    fn classify(self) -> Selector<K> {
        Selector::Sequence(self.clone())
    }
}

impl<K, const N: usize> Classify<K> for [K; N] {
    fn classify(self) -> Selector<K> {
        Selector::Sequence(Vec::from(self))
    }
}

impl<K: Clone> Classify<K> for &[K] {
    fn classify(self) -> Selector<K> {
        Selector::Sequence(self.to_vec())
    }
}

impl<K> Classify<K> for VecDeque<K> {
    fn classify(self) -> Selector<K> {
        Selector::Sequence(self.into())
    }
}

impl<K, H> Classify<K> for HashSet<K, H>
where
    K: Eq + Hash,
{
    fn classify(self) -> Selector<K> {
        self.into_iter().collect()
    }
}

impl<K, H> Classify<K> for &HashSet<K, H>
where
    K: Eq + Hash + Clone,
{
    fn classify(self) -> Selector<K> {
        self.iter().cloned().collect()
    }
}

impl<K, H> Classify<K> for hashbrown::HashSet<K, H>
where
    K: Eq + Hash,
    H: BuildHasher,
{
    fn classify(self) -> Selector<K> {
        self.into_iter().collect()
    }
}

impl<K: Eq + Hash> Classify<K> for BTreeSet<K> {
    fn classify(self) -> Selector<K> {
        self.into_iter().collect()
    }
}

/// The value side of `PolyMap::set`.
///
/// Any `V` converts into `Fill::One`; a batch of positional values is built
/// with `Fill::each`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fill<V> {
    /// One value, assigned to every addressed key.
    One(V),
    /// Values paired with a key sequence by position.
    Each(Vec<V>),
}

impl<V> Fill<V> {
    pub fn each<I>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
    {
        Fill::Each(values.into_iter().collect())
    }
}

impl<V> From<V> for Fill<V> {
    fn from(value: V) -> Self {
        Fill::One(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_classify_as_scalar() {
        assert_eq!(Classify::<i32>::classify(7), Selector::Scalar(7));
        assert_eq!(Classify::<char>::classify(&'x'), Selector::Scalar('x'));
        assert_eq!(Classify::<&str>::classify("a"), Selector::Scalar("a"));
        assert_eq!(
            Classify::<String>::classify("a"),
            Selector::Scalar("a".to_string())
        );
    }

    #[test]
    fn ordered_collections_keep_order_and_duplicates() {
        let expected = Selector::Sequence(vec!["c", "a", "c"]);
        assert_eq!(["c", "a", "c"].classify(), expected);
        assert_eq!(vec!["c", "a", "c"].classify(), expected);
        assert_eq!((&["c", "a", "c"][..]).classify(), expected);
        assert_eq!(VecDeque::from(vec!["c", "a", "c"]).classify(), expected);
    }

    #[test]
    fn unordered_collections_classify_as_set() {
        let expected: Selector<u8> = Selector::Set(HashSet::from([1, 2]));
        assert_eq!(HashSet::from([1u8, 2]).classify(), expected);
        assert_eq!(BTreeSet::from([2u8, 1]).classify(), expected);
        let hb: hashbrown::HashSet<u8> = [1u8, 2].into_iter().collect();
        assert_eq!(hb.classify(), expected);
        let generic: Selector<u8> = [1u8, 2, 2, 1].into_iter().collect();
        assert_eq!(generic, expected);
    }

    #[test]
    fn len_counts_addressed_keys() {
        assert_eq!(Selector::Scalar(1).len(), 1);
        assert_eq!(Selector::Sequence(vec![1, 1, 2]).len(), 3);
        assert_eq!([1, 1, 2].into_iter().collect::<Selector<_>>().len(), 2);
        assert!(Selector::<i32>::Invalid.is_empty());
    }

    #[test]
    fn fill_conversions() {
        assert_eq!(Fill::from(3), Fill::One(3));
        assert_eq!(Fill::each([1, 2]), Fill::Each(vec![1, 2]));
    }
}
