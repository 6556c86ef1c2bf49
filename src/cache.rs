use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Request-scoped memo of resolved values, owned by a single `LoaderWorker`.
pub trait Cache {
    type K;
    type V;

    /// Returns all the values associated with the provided keys in order with their respective
    /// keys.
    fn get(&self, keys: &[Self::K]) -> Vec<Option<&Self::V>>;

    /// Returns the subset of `keys` that have no cached value, in the order they were given.
    fn missing(&self, keys: &[Self::K]) -> Vec<Self::K>;

    fn insert(&mut self, key: Self::K, value: Self::V);
    fn insert_many<I: IntoIterator<Item = (Self::K, Self::V)>>(&mut self, key_vals: I);

    fn remove(&mut self, keys: &[Self::K]);

    fn len(&self) -> usize;
}

impl<K, V, S: BuildHasher> Cache for HashMap<K, V, S>
where
    K: Eq + Hash + Copy,
{
    type K = K;
    type V = V;

    fn get(&self, keys: &[Self::K]) -> Vec<Option<&Self::V>> {
        keys.iter().map(|k| HashMap::get(self, k)).collect::<Vec<_>>()
    }

    fn missing(&self, keys: &[Self::K]) -> Vec<Self::K> {
        keys.iter().filter(|k| !self.contains_key(*k)).copied().collect::<Vec<_>>()
    }

    fn insert(&mut self, key: Self::K, value: Self::V) {
        HashMap::insert(self, key, value);
    }

    fn insert_many<I: IntoIterator<Item = (Self::K, Self::V)>>(&mut self, key_vals: I) {
        self.extend(key_vals);
    }

    fn remove(&mut self, keys: &[Self::K]) {
        for key in keys.iter() {
            HashMap::remove(self, key);
        }
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }
}
