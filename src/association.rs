//! Partitioning grouped-fetch rows back onto the keys that requested them.
//!
//! A grouped fetch returns rows for many keys at once, in whatever order the store produced them.
//! [`associate`] builds the key → value map a [`BatchFunction`](crate::BatchFunction) returns by
//! reading each row's foreign key, so nothing depends on row order.

use std::collections::HashMap;
use std::hash::Hash;

/// How many records one key can own under a relation.
pub trait Cardinality: Default {
    type Item;

    fn absorb(&mut self, item: Self::Item);
}

/// At most one record per key. If the store returns more, the first one wins.
impl<T> Cardinality for Option<T> {
    type Item = T;

    fn absorb(&mut self, item: T) {
        if self.is_none() {
            *self = Some(item);
        }
    }
}

/// Any number of records per key, in row order.
impl<T> Cardinality for Vec<T> {
    type Item = T;

    fn absorb(&mut self, item: T) {
        self.push(item);
    }
}

/// Groups `rows` under the requested `keys`.
///
/// `split` extracts the foreign key of a row and the item to store under it. Every requested key
/// gets an entry, empty if no row referenced it. Rows whose key was not requested are dropped.
pub fn associate<K, R, C, I, S>(keys: &[K], rows: I, split: S) -> HashMap<K, C>
where
    K: Eq + Hash + Copy,
    C: Cardinality,
    I: IntoIterator<Item = R>,
    S: Fn(R) -> (K, C::Item),
{
    let mut associated = keys.iter().map(|key| (*key, C::default())).collect::<HashMap<_, _>>();
    for row in rows {
        let (key, item) = split(row);
        if let Some(slot) = associated.get_mut(&key) {
            slot.absorb(item);
        }
    }
    associated
}
