use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreError;

/// A `BatchFunction` defines the grouped fetch through which a `Loader` obtains values for the
/// keys staged during its most recent execution frame. It receives the sorted, de-duplicated slice
/// of keys that missed the loader cache, and some user defined context struct (usually a handle
/// to the store).
///
/// The returned map is keyed by the requested keys. It does not need to hold an entry for every
/// key: requesters of keys that are missing from the map receive `V::default()`, which is how a
/// relation expresses "no association" (`None` for at-most-one relations, an empty `Vec` for
/// to-many relations). See [`associate`](crate::association::associate) for building the map from
/// raw rows.
///
/// An `Err` fails every request that was waiting on this dispatch.
///
/// Multiple `BatchFunctions` (and therefore loaders) can share the same context (likely through an
/// `Arc`).
#[async_trait]
pub trait BatchFunction<K, V> {
    type Context;
    async fn load(keys: &[K], context: &Self::Context) -> Result<HashMap<K, V>, StoreError>;
}
