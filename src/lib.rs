//! poly-map: a hash map whose subscripts and set operators dispatch on the
//! shape of their argument.
//!
//! `PolyMap::get`, `set` and `delete` accept a single key, an ordered
//! sequence of keys or an unordered set of keys, and apply the batch
//! semantics matching that shape. `difference`, `intersect`, `union` and
//! `symmetric_difference` combine a map with another map or with a plain key
//! set, resolving values from whichever operand holds them.
//!
//! Internal Design:
//!
//! Layers
//! - SlotStore<K, V, S>: structural associative container. Entries live in
//!   a `SlotMap`, a `hashbrown::HashTable` indexes them by a stored hash,
//!   and lookups return generational `Slot` handles. Guarded by a
//!   debug-only reentrancy tracker around every probe.
//! - Selector<K> / Classify<K>: the closed shape classification. Each
//!   argument becomes exactly one of Scalar, Sequence, Set or Invalid before
//!   dispatch, and every dispatching operation matches on it exhaustively.
//! - PolyMap<K, V, S>: public API. Holds a SlotStore by composition and
//!   delegates the ordinary map surface (len, containment, iteration,
//!   equality) to it.
//! - Operand<'o, K, V, S>: right operand of the set operations, either a
//!   map or bare keys. Value resolution branches on it once.
//!
//! Invariants
//! - The key view (`PolyMap::keys`) borrows the map, so it is recomputed on
//!   every call and cannot go stale.
//! - Batch reads and deletes resolve every key before producing output or
//!   removing anything; a missing key fails the call with no side effect.
//! - A sequence read resolves keys to slots up front and yields values from
//!   those slots lazily, in input order.
//! - Set operations never mutate either operand.
//!
//! Sentinel
//! - Keys contributed only by a plain key set have no value to resolve.
//!   `union` and `symmetric_difference` give them `V::default()`; for
//!   `Option<T>` that is `None`. `union_or` and `symmetric_difference_or`
//!   take an explicit fill value instead.
//!
//! Notes and non-goals
//! - Single-threaded: the map is `Send` but not `Sync`; wrap it in a lock to
//!   share it.
//! - Iteration order is the store's slot order and carries no meaning.
//! - `Debug` output is for humans, not a serialization format.

mod error;
mod key_view;
mod poly_map;
mod reentrancy;
mod selector;
mod set_ops;
mod slot_store;

// Public surface
pub use error::Error;
pub use key_view::{KeyIter, KeyView};
pub use poly_map::{Fetched, Gathered, PolyMap};
pub use selector::{Classify, Fill, Selector};
pub use set_ops::Operand;
pub use slot_store::{IntoIter, Iter, IterMut};

/// Builds a `PolyMap`.
///
/// Field-style assignments produce `&'static str` keys named after the
/// fields; `key => value` pairs take arbitrary key expressions. Later
/// duplicates overwrite earlier ones.
///
/// ```
/// use poly_map::polymap;
///
/// let fields = polymap!(a = 1, b = 2);
/// let pairs = polymap! { "a" => 1, "b" => 2 };
/// assert_eq!(fields, pairs);
/// ```
#[macro_export]
macro_rules! polymap {
    () => {
        $crate::PolyMap::new()
    };
    ($($field:ident = $value:expr),+ $(,)?) => {
        $crate::PolyMap::from([$((stringify!($field), $value)),+])
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::PolyMap::from([$(($key, $value)),+])
    };
}
