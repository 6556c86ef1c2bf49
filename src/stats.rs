/// Counters kept by a loader worker over its lifetime (one request).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoaderStats {
    /// Number of `LoaderOp::Load` that were received by the worker.
    pub load_requests: u32,
    /// The total number of keys that were requested for loading (not necessarily unique).
    pub keys_requested: u32,
    /// The number of requested keys that were immediately found in the loader cache.
    pub cache_hits: u32,
    /// Number of times the batch function was invoked.
    pub dispatches: u32,
    /// The total number of unique keys handed to the batch function.
    pub keys_dispatched: u32,
    /// The max number of unique keys handed to the batch function in a single dispatch.
    pub max_batch_size: u32,
    /// Number of dispatches whose batch function returned an error.
    pub fetch_failures: u32,
}

impl LoaderStats {
    pub(crate) fn record_load_request(&mut self, keys_requested: usize, cache_hits: usize) {
        self.load_requests += 1;
        self.keys_requested += keys_requested as u32;
        self.cache_hits += cache_hits as u32;
    }

    pub(crate) fn record_dispatch(&mut self, unique_keys: usize) {
        let unique_keys = unique_keys as u32;
        self.dispatches += 1;
        self.keys_dispatched += unique_keys;
        self.max_batch_size = self.max_batch_size.max(unique_keys);
    }

    pub(crate) fn record_fetch_failure(&mut self) {
        self.fetch_failures += 1;
    }
}
